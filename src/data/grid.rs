use log::debug;
use ndarray::s;
use serde::Serialize;

use super::model::RawTable;
use crate::error::{AdmError, Result};

const TEMPERATURE_COL: usize = 0;
const VOLTAGE_COL: usize = 1;

/// Voltages are rounded to this many decimals to absorb noise in the file.
const VOLTAGE_DECIMALS: i32 = 6;

/// Two rounded voltages closer than this are the same grid point.
const VOLTAGE_TOLERANCE: f64 = 1.5e-6;

/// The sweep structure implied by the temperature and voltage columns.
///
/// Files store one block of rows per temperature, each block running through
/// the same voltage sequence. Nothing in the header describes this, so it is
/// recovered from the data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    /// Voltages of the first temperature block, rounded to 6 decimals.
    pub voltage: Vec<f64>,
    /// One temperature per block, taken from the block's first row.
    pub temperature: Vec<f64>,
    /// The whole table is a single temperature block.
    pub single_temperature: bool,
}

impl Grid {
    /// Rows per temperature block.
    pub fn block_len(&self) -> usize {
        self.voltage.len()
    }

    /// First row of the `block`-th temperature block.
    pub fn block_start(&self, block: usize) -> usize {
        block * self.block_len()
    }

    /// The temperature every extraction must use when the file has only one.
    pub fn fixed_temperature(&self) -> Option<f64> {
        if self.single_temperature {
            self.temperature.first().copied()
        } else {
            None
        }
    }

    /// The voltage every extraction must use when blocks hold a single row.
    pub fn fixed_voltage(&self) -> Option<f64> {
        match self.voltage.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }
}

fn round_voltage(v: f64) -> f64 {
    let scale = 10f64.powi(VOLTAGE_DECIMALS);
    (v * scale).round() / scale
}

/// Infer voltage and temperature axes from `table`.
///
/// The first block ends at the first row whose temperature differs from
/// row 0. Every later block must have the same length and voltage sequence,
/// otherwise the table is rejected with [`AdmError::IrregularGrid`]. So are
/// tables with a NaN or infinite temperature or voltage.
pub fn infer_grid(table: &RawTable) -> Result<Grid> {
    let (nrows, ncols) = table.dim();
    if nrows == 0 {
        return Err(AdmError::EmptyTable);
    }
    if ncols <= VOLTAGE_COL {
        return Err(AdmError::IrregularGrid(format!(
            "{ncols} columns, expected temperature and voltage"
        )));
    }

    let temps = table.column(TEMPERATURE_COL);
    let volts = table.column(VOLTAGE_COL);
    if let Some(r) = (0..nrows).find(|&r| !temps[r].is_finite() || !volts[r].is_finite()) {
        return Err(AdmError::IrregularGrid(format!(
            "row {} has temperature {} and voltage {}",
            r + 1,
            temps[r],
            volts[r]
        )));
    }

    let first_temp = temps[0];
    let voltage: Vec<f64> = temps
        .iter()
        .zip(volts.iter())
        .take_while(|&(&t, _)| t == first_temp)
        .map(|(_, &v)| round_voltage(v))
        .collect();
    // row 0 always matches itself
    let block = voltage.len().max(1);
    let single_temperature = block == nrows;

    if nrows % block != 0 {
        return Err(AdmError::IrregularGrid(format!(
            "{nrows} rows do not split into blocks of {block} voltages"
        )));
    }

    for start in (block..nrows).step_by(block) {
        let found = volts.slice(s![start..start + block]);
        for (offset, (expected, &v)) in voltage.iter().zip(found.iter()).enumerate() {
            let found = round_voltage(v);
            if (found - expected).abs() > VOLTAGE_TOLERANCE {
                return Err(AdmError::IrregularGrid(format!(
                    "row {} has voltage {found}, expected {expected} as in the first block",
                    start + offset + 1
                )));
            }
        }
    }

    let temperature = temps.slice(s![..;block]).to_vec();
    debug!(
        "grid: {} voltages x {} temperatures{}",
        block,
        temperature.len(),
        if single_temperature { " (single block)" } else { "" }
    );

    Ok(Grid {
        voltage,
        temperature,
        single_temperature,
    })
}
