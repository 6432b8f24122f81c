use std::io::Read;
use std::path::Path;

use log::{debug, info};

use super::header::parse_header;
use super::model::{table_from_rows, AdmFile, RawTable};
use crate::error::{AdmError, Result};

// ---------------------------------------------------------------------------
// Input source
// ---------------------------------------------------------------------------

/// Where an admittance file comes from: a path on disk or an already-open
/// stream (e.g. a member of an archive being extracted in memory).
pub enum Source<'a> {
    Path(&'a Path),
    Reader(&'a mut dyn Read),
}

impl<'a> From<&'a Path> for Source<'a> {
    fn from(path: &'a Path) -> Self {
        Source::Path(path)
    }
}

impl Source<'_> {
    /// Read the whole input. A file opened here is closed before returning.
    fn read_to_string(self) -> Result<String> {
        match self {
            Source::Path(path) => {
                debug!("reading {}", path.display());
                Ok(std::fs::read_to_string(path)?)
            }
            Source::Reader(reader) => {
                let mut text = String::new();
                reader.read_to_string(&mut text)?;
                Ok(text)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Read header metadata, frequency list and numeric table from `source`.
pub fn read(source: Source<'_>) -> Result<AdmFile> {
    let text = source.read_to_string()?;
    let lines: Vec<&str> = text.lines().collect();

    let header = parse_header(&lines)?;
    let table = parse_table(&lines[header.data_start..], header.data_start)?;

    let expected = 2 + 2 * header.frequencies.len();
    if table.ncols() != expected {
        return Err(AdmError::ColumnMismatch {
            found: table.ncols(),
            frequencies: header.frequencies.len(),
            expected,
        });
    }

    info!(
        "read {} rows x {} columns, {} frequencies, area={} epsilon={}",
        table.nrows(),
        table.ncols(),
        header.frequencies.len(),
        header.metadata.area,
        header.metadata.epsilon
    );

    Ok(AdmFile {
        table,
        frequencies: header.frequencies,
        metadata: header.metadata,
        data_start: header.data_start,
    })
}

/// Shorthand for `read(Source::Path(path))`.
pub fn read_path(path: impl AsRef<Path>) -> Result<AdmFile> {
    read(Source::Path(path.as_ref()))
}

// ---------------------------------------------------------------------------
// Numeric table
// ---------------------------------------------------------------------------

/// Parse whitespace-separated floats, one row per line. `offset` is the
/// number of lines preceding `lines` in the file, used for error positions.
///
/// Blank lines and anything after a `#` are ignored.
pub fn parse_table(lines: &[&str], offset: usize) -> Result<RawTable> {
    let mut rows: Vec<Vec<f64>> = Vec::with_capacity(lines.len());
    let mut width = None;

    for (i, raw) in lines.iter().enumerate() {
        let line_no = offset + i + 1;
        let content = raw.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }

        let row = content
            .split_whitespace()
            .map(|token| {
                token.parse::<f64>().map_err(|_| AdmError::InvalidNumber {
                    line: line_no,
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        let expected = *width.get_or_insert(row.len());
        if row.len() != expected {
            return Err(AdmError::RaggedRow {
                line: line_no,
                expected,
                found: row.len(),
            });
        }
        rows.push(row);
    }

    table_from_rows(rows)
}
