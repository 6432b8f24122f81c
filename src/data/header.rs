use log::{debug, warn};

use super::model::Metadata;
use crate::error::{AdmError, Result};

/// Prefix of the column-header line that ends the header block.
const COLUMN_HEADER_PREFIX: &str = "#Temp";

/// Prefix of the capacitance column labels carrying a frequency.
const CAPACITANCE_LABEL_PREFIX: &str = "#C";

// ---------------------------------------------------------------------------
// Header – what the scan recovers before the numeric block
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// 1-based line number of the `#Temp` line; numeric data follows it.
    pub data_start: usize,
    /// Frequencies in the order of the capacitance columns.
    pub frequencies: Vec<f64>,
    pub metadata: Metadata,
}

/// Scan `lines` for the column-header line and the experiment metadata
/// above it.
///
/// Fails with [`AdmError::HeaderNotFound`] when no line starts with `#Temp`.
pub fn parse_header(lines: &[&str]) -> Result<Header> {
    let idx = lines
        .iter()
        .position(|line| line.starts_with(COLUMN_HEADER_PREFIX))
        .ok_or(AdmError::HeaderNotFound { lines: lines.len() })?;
    let data_start = idx + 1;

    let frequencies = parse_frequencies(lines[idx], data_start)?;
    if frequencies.is_empty() {
        return Err(AdmError::MalformedHeader {
            line: data_start,
            field: lines[idx].trim().to_string(),
        });
    }
    debug!(
        "column header on line {data_start}: {} frequencies {frequencies:?}",
        frequencies.len()
    );

    let metadata = parse_metadata(&lines[..idx])?;
    Ok(Header {
        data_start,
        frequencies,
        metadata,
    })
}

/// Every tab-separated `#C...` label yields one frequency built from the
/// digits it contains, so `#C100Hz` reads as 100.
fn parse_frequencies(line: &str, line_no: usize) -> Result<Vec<f64>> {
    line.split('\t')
        .filter(|field| field.starts_with(CAPACITANCE_LABEL_PREFIX))
        .map(|field| {
            let digits: String = field.chars().filter(char::is_ascii_digit).collect();
            digits.parse::<f64>().map_err(|_| AdmError::MalformedHeader {
                line: line_no,
                field: field.trim().to_string(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Metadata formats
// ---------------------------------------------------------------------------

/// One way of writing area and permittivity into the header.
struct MetadataFormat {
    name: &'static str,
    recognises: fn(&str) -> bool,
    /// Receives the recognised lines as (1-based line number, text).
    parse: fn(&[(usize, &str)]) -> Result<Metadata>,
}

/// Tried in order; the first format with at least one recognised line wins.
static FORMATS: [MetadataFormat; 2] = [
    MetadataFormat {
        name: "legacy #Epsilon line",
        recognises: is_legacy_line,
        parse: parse_legacy,
    },
    MetadataFormat {
        name: "area/epsilon lines",
        recognises: is_separate_line,
        parse: parse_separate,
    },
];

fn parse_metadata(header: &[&str]) -> Result<Metadata> {
    let mut chosen: Option<(&MetadataFormat, Vec<(usize, &str)>)> = None;

    for format in &FORMATS {
        let matched: Vec<(usize, &str)> = header
            .iter()
            .enumerate()
            .filter(|(_, line)| (format.recognises)(line))
            .map(|(i, line)| (i + 1, *line))
            .collect();
        if matched.is_empty() {
            continue;
        }
        match &chosen {
            Some((first, _)) => warn!(
                "header contains both {} and {}; using the {}",
                first.name, format.name, first.name
            ),
            None => chosen = Some((format, matched)),
        }
    }

    match chosen {
        Some((format, lines)) => {
            let metadata = (format.parse)(&lines)?;
            debug!("metadata from {}: {metadata:?}", format.name);
            Ok(metadata)
        }
        None => {
            warn!("header has no area or permittivity; both default to 0");
            Ok(Metadata::default())
        }
    }
}

fn is_legacy_line(line: &str) -> bool {
    line.contains("#Epsilon")
}

fn is_separate_line(line: &str) -> bool {
    line.starts_with("area =") || line.starts_with("epsilon =")
}

/// Old instrument software writes a single line such as
/// `#Contact\t#Area=0.00144\t#Epsilon=8.90`: area is the second tab field,
/// permittivity the third, each after an `=`.
fn parse_legacy(lines: &[(usize, &str)]) -> Result<Metadata> {
    let Some(&(line_no, line)) = lines.last() else {
        return Ok(Metadata::default());
    };
    let fields: Vec<&str> = line.split('\t').collect();
    let field = |i: usize| -> Result<f64> {
        let text = fields.get(i).ok_or_else(|| AdmError::MalformedHeader {
            line: line_no,
            field: line.trim().to_string(),
        })?;
        value_after_eq(text, line_no)
    };
    Ok(Metadata {
        area: field(1)?,
        epsilon: field(2)?,
    })
}

/// `area = 0.1` and `epsilon = 10` on lines of their own; a repeated key
/// keeps its last value.
fn parse_separate(lines: &[(usize, &str)]) -> Result<Metadata> {
    let mut metadata = Metadata::default();
    for &(line_no, line) in lines {
        if line.starts_with("area =") {
            metadata.area = value_after_eq(line, line_no)?;
        } else if line.starts_with("epsilon =") {
            metadata.epsilon = value_after_eq(line, line_no)?;
        }
    }
    Ok(metadata)
}

fn value_after_eq(text: &str, line_no: usize) -> Result<f64> {
    text.split('=')
        .nth(1)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .ok_or_else(|| AdmError::MalformedHeader {
            line: line_no,
            field: text.trim().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn lines(text: &str) -> Vec<&str> {
        text.lines().collect()
    }

    #[test]
    fn separate_area_and_epsilon_lines() {
        let text = "sample A\narea = 0.1\nepsilon = 10\n#Temp\t#Volt\t#C20\t#C100\t#C1000\t#G20\t#G100\t#G1000\n1 2";
        let header = parse_header(&lines(text)).unwrap();
        assert_eq!(header.data_start, 4);
        assert_eq!(header.frequencies, vec![20.0, 100.0, 1000.0]);
        assert_relative_eq!(header.metadata.area, 0.1);
        assert_relative_eq!(header.metadata.epsilon, 10.0);
    }

    #[test]
    fn legacy_epsilon_line() {
        let text = "#Contact\t#Area=0.00144\t#Epsilon=8.90\n#Temp\t#Volt\t#C1000000\t#G1000000";
        let header = parse_header(&lines(text)).unwrap();
        assert_eq!(header.data_start, 2);
        assert_eq!(header.frequencies, vec![1.0e6]);
        assert_relative_eq!(header.metadata.area, 0.00144);
        assert_relative_eq!(header.metadata.epsilon, 8.90);
    }

    #[test]
    fn legacy_line_takes_precedence_over_separate_lines() {
        let text = "area = 5\n#Contact\tA=0.2\t#Epsilon=3\n#Temp\t#C1";
        let header = parse_header(&lines(text)).unwrap();
        assert_relative_eq!(header.metadata.area, 0.2);
        assert_relative_eq!(header.metadata.epsilon, 3.0);
    }

    #[test]
    fn missing_metadata_defaults_to_zero() {
        let header = parse_header(&lines("#Temp\t#C50")).unwrap();
        assert_eq!(header.metadata, Metadata::default());
        assert_eq!(header.data_start, 1);
    }

    #[test]
    fn frequency_labels_keep_only_digits() {
        let header = parse_header(&lines("#Temp\t#Volt\t#C100Hz\t#C1kHz\t#GX")).unwrap();
        assert_eq!(header.frequencies, vec![100.0, 1.0]);
    }

    #[test]
    fn missing_column_header_is_an_error() {
        let err = parse_header(&lines("area = 1\n1 2 3\n")).unwrap_err();
        assert!(matches!(err, AdmError::HeaderNotFound { lines: 2 }));
    }

    #[test]
    fn label_without_digits_is_malformed() {
        let err = parse_header(&lines("x\n#Temp\t#Cap")).unwrap_err();
        assert!(matches!(err, AdmError::MalformedHeader { line: 2, .. }));
    }

    #[test]
    fn column_header_needs_capacitance_labels() {
        let err = parse_header(&lines("#Temp\t#Volt")).unwrap_err();
        assert!(matches!(err, AdmError::MalformedHeader { line: 1, .. }));
    }

    #[test]
    fn unparsable_area_is_malformed() {
        let err = parse_header(&lines("area = n/a\n#Temp\t#C1")).unwrap_err();
        assert!(matches!(err, AdmError::MalformedHeader { line: 1, .. }));
    }
}
