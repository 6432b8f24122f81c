use ndarray::Array2;
use serde::Serialize;

use crate::error::{AdmError, Result};

// ---------------------------------------------------------------------------
// Metadata – experiment constants recovered from the file header
// ---------------------------------------------------------------------------

/// Contact area and relative permittivity. Both are `0.0` when the header
/// does not mention them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Metadata {
    /// Contact area in cm².
    pub area: f64,
    /// Relative permittivity of the material (dimensionless).
    pub epsilon: f64,
}

// ---------------------------------------------------------------------------
// RawTable – the numeric block below the header
// ---------------------------------------------------------------------------

/// Numeric table, one row per measurement point.
///
/// Column layout: `[temperature, voltage, C_f1..C_fF, G_f1..G_fF]`.
pub type RawTable = Array2<f64>;

/// Build a table from rows of equal width.
///
/// Fails with [`AdmError::EmptyTable`] when there are no rows and with
/// [`AdmError::RaggedRow`] when a row is wider or narrower than the first.
pub fn table_from_rows(rows: Vec<Vec<f64>>) -> Result<RawTable> {
    let ncols = match rows.first() {
        Some(first) if !first.is_empty() => first.len(),
        _ => return Err(AdmError::EmptyTable),
    };
    let nrows = rows.len();
    let mut values = Vec::with_capacity(nrows * ncols);
    for (i, row) in rows.into_iter().enumerate() {
        if row.len() != ncols {
            return Err(AdmError::RaggedRow {
                line: i + 1,
                expected: ncols,
                found: row.len(),
            });
        }
        values.extend(row);
    }
    Ok(Array2::from_shape_vec((nrows, ncols), values)?)
}

// ---------------------------------------------------------------------------
// AdmFile – everything `read` recovers from one file
// ---------------------------------------------------------------------------

/// A parsed admittance file.
#[derive(Debug, Clone)]
pub struct AdmFile {
    pub table: RawTable,
    /// Measurement frequencies in column order.
    pub frequencies: Vec<f64>,
    pub metadata: Metadata,
    /// 1-based line number of the `#Temp` header line.
    pub data_start: usize,
}
