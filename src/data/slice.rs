use std::fmt;
use std::str::FromStr;

use log::debug;
use ndarray::s;
use serde::Serialize;

use super::grid::{infer_grid, Grid};
use super::model::{AdmFile, RawTable};
use crate::constants::angular_frequency;
use crate::error::{AdmError, Result};

/// Capacitance columns start after temperature and voltage.
const FIRST_DATA_COL: usize = 2;

// ---------------------------------------------------------------------------
// Selection – what the caller asked for
// ---------------------------------------------------------------------------

/// Requested frequency, voltage and temperature. Two of the three must be
/// known; the curve runs along the remaining one.
///
/// `Some(0.0)` is a real selector (0 V bias is common), distinct from `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Selection {
    pub frequency: Option<f64>,
    pub voltage: Option<f64>,
    pub temperature: Option<f64>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frequency(mut self, hz: f64) -> Self {
        self.frequency = Some(hz);
        self
    }

    pub fn with_voltage(mut self, volts: f64) -> Self {
        self.voltage = Some(volts);
        self
    }

    pub fn with_temperature(mut self, kelvin: f64) -> Self {
        self.temperature = Some(kelvin);
        self
    }

    /// Overwrite the selectors that `other` specifies, keep the rest.
    pub fn merge(&mut self, other: Selection) {
        if other.frequency.is_some() {
            self.frequency = other.frequency;
        }
        if other.voltage.is_some() {
            self.voltage = other.voltage;
        }
        if other.temperature.is_some() {
            self.temperature = other.temperature;
        }
    }

    /// Decide which curve this selection describes.
    ///
    /// An axis with a single value (one frequency column, one voltage per
    /// block, one temperature block) is filled in automatically. If that
    /// leaves all three fixed, the curve runs along the first such axis in
    /// temperature, voltage, frequency order and has a single point.
    pub fn resolve(&self, frequencies: &[f64], grid: &Grid) -> Result<Slice> {
        let single_frequency = match frequencies {
            [only] => Some(*only),
            _ => None,
        };
        let f = self.frequency.or(single_frequency);
        let v = self.voltage.or(grid.fixed_voltage());
        let t = self.temperature.or(grid.fixed_temperature());

        let slice = match (f, v, t) {
            (Some(frequency), Some(voltage), None) => Slice::OverTemperature { frequency, voltage },
            (Some(frequency), None, Some(temperature)) => Slice::OverVoltage {
                frequency,
                temperature,
            },
            (None, Some(voltage), Some(temperature)) => Slice::OverFrequency {
                voltage,
                temperature,
            },
            (Some(frequency), Some(voltage), Some(temperature)) => {
                if self.temperature.is_none() {
                    Slice::OverTemperature { frequency, voltage }
                } else if self.voltage.is_none() {
                    Slice::OverVoltage {
                        frequency,
                        temperature,
                    }
                } else if self.frequency.is_none() {
                    Slice::OverFrequency {
                        voltage,
                        temperature,
                    }
                } else {
                    return Err(AdmError::OverSpecified);
                }
            }
            _ => return Err(AdmError::InsufficientSelectors),
        };
        debug!("{self:?} resolves to {slice:?}");
        Ok(slice)
    }
}

// ---------------------------------------------------------------------------
// Slice – one of the three 1D curves
// ---------------------------------------------------------------------------

/// A one-dimensional cut through the measurement grid, named by the axis
/// that varies along it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "sweep", rename_all = "snake_case")]
pub enum Slice {
    /// C–T / G–T at fixed frequency and voltage.
    OverTemperature { frequency: f64, voltage: f64 },
    /// C–V / G–V at fixed frequency and temperature.
    OverVoltage { frequency: f64, temperature: f64 },
    /// C–f / G–f at fixed voltage and temperature.
    OverFrequency { voltage: f64, temperature: f64 },
}

impl Slice {
    /// Name of the varying axis.
    pub fn axis_name(&self) -> &'static str {
        match self {
            Slice::OverTemperature { .. } => "temperature",
            Slice::OverVoltage { .. } => "voltage",
            Slice::OverFrequency { .. } => "frequency",
        }
    }
}

/// Index of the value in `axis` closest to `target`; ties go to the lowest
/// index.
fn nearest(axis: &[f64], target: f64) -> usize {
    axis.iter()
        .enumerate()
        .fold((0, f64::INFINITY), |(best, best_dist), (i, &value)| {
            let dist = (value - target).abs();
            if dist < best_dist {
                (i, dist)
            } else {
                (best, best_dist)
            }
        })
        .0
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Capacitance and conductance along one slice, with the full axes for
/// context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedCurve {
    /// The slice actually taken: selectors are replaced by the nearest
    /// values present in the file.
    pub slice: Slice,
    /// Parallel capacitance in farads.
    pub capacitance: Vec<f64>,
    /// Conductance in siemens.
    pub conductance: Vec<f64>,
    pub voltage: Vec<f64>,
    pub temperature: Vec<f64>,
    pub frequency: Vec<f64>,
}

impl ExtractedCurve {
    /// Values of the varying axis, one per sample.
    pub fn sweep_axis(&self) -> &[f64] {
        match self.slice {
            Slice::OverTemperature { .. } => &self.temperature,
            Slice::OverVoltage { .. } => &self.voltage,
            Slice::OverFrequency { .. } => &self.frequency,
        }
    }

    /// Measurement frequency of each sample.
    fn sample_frequencies(&self) -> Vec<f64> {
        match self.slice {
            Slice::OverTemperature { frequency, .. } | Slice::OverVoltage { frequency, .. } => {
                vec![frequency; self.capacitance.len()]
            }
            Slice::OverFrequency { .. } => self.frequency.clone(),
        }
    }

    /// Dissipation factor `D = G / (2π f C)`.
    pub fn dissipation(&self) -> Vec<f64> {
        self.sample_frequencies()
            .iter()
            .zip(self.capacitance.iter().zip(&self.conductance))
            .map(|(&f, (&c, &g))| g / (angular_frequency(f) * c))
            .collect()
    }

    /// Series capacitance `C (1 + D²)`.
    pub fn series_capacitance(&self) -> Vec<f64> {
        self.capacitance
            .iter()
            .zip(self.dissipation())
            .map(|(&c, d)| c * (1.0 + d * d))
            .collect()
    }

    pub fn capacitance(&self, model: CapacitanceModel) -> Vec<f64> {
        match model {
            CapacitanceModel::Parallel => self.capacitance.clone(),
            CapacitanceModel::Series => self.series_capacitance(),
        }
    }

    pub fn len(&self) -> usize {
        self.capacitance.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capacitance.is_empty()
    }
}

/// Infer the grid of `table`, resolve `selection` against it and extract.
pub fn extract(table: &RawTable, frequencies: &[f64], selection: &Selection) -> Result<ExtractedCurve> {
    let grid = infer_grid(table)?;
    let slice = selection.resolve(frequencies, &grid)?;
    extract_slice(table, frequencies, &grid, slice)
}

/// Cut `slice` out of `table`, matching every fixed value to the nearest
/// value on its axis.
pub fn extract_slice(
    table: &RawTable,
    frequencies: &[f64],
    grid: &Grid,
    slice: Slice,
) -> Result<ExtractedCurve> {
    let nf = frequencies.len();
    let expected = FIRST_DATA_COL + 2 * nf;
    if nf == 0 || table.ncols() != expected {
        return Err(AdmError::ColumnMismatch {
            found: table.ncols(),
            frequencies: nf,
            expected,
        });
    }

    let blocks = grid.temperature.len();
    let block = grid.block_len();
    if block == 0 || blocks == 0 || block * blocks != table.nrows() {
        return Err(AdmError::IrregularGrid(format!(
            "{block} voltages x {blocks} temperatures do not cover {} rows",
            table.nrows()
        )));
    }

    let cap_col = |j: usize| FIRST_DATA_COL + j;
    let cond_col = |j: usize| FIRST_DATA_COL + nf + j;

    let (snapped, capacitance, conductance) = match slice {
        Slice::OverTemperature { frequency, voltage } => {
            let i = nearest(&grid.voltage, voltage);
            let j = nearest(frequencies, frequency);
            debug!("C-T: voltage index {i}, frequency index {j}");
            (
                Slice::OverTemperature {
                    frequency: frequencies[j],
                    voltage: grid.voltage[i],
                },
                table.slice(s![i..;block, cap_col(j)]).to_vec(),
                table.slice(s![i..;block, cond_col(j)]).to_vec(),
            )
        }
        Slice::OverVoltage {
            frequency,
            temperature,
        } => {
            let j = nearest(frequencies, frequency);
            let b = nearest(&grid.temperature, temperature);
            let k = grid.block_start(b);
            debug!("C-V: frequency index {j}, block {b} at row {k}");
            (
                Slice::OverVoltage {
                    frequency: frequencies[j],
                    temperature: grid.temperature[b],
                },
                table.slice(s![k..k + block, cap_col(j)]).to_vec(),
                table.slice(s![k..k + block, cond_col(j)]).to_vec(),
            )
        }
        Slice::OverFrequency {
            voltage,
            temperature,
        } => {
            let i = nearest(&grid.voltage, voltage);
            let b = nearest(&grid.temperature, temperature);
            let row = table.row(grid.block_start(b) + i);
            debug!("C-f: voltage index {i}, block {b}");
            (
                Slice::OverFrequency {
                    voltage: grid.voltage[i],
                    temperature: grid.temperature[b],
                },
                row.slice(s![cap_col(0)..cap_col(nf)]).to_vec(),
                row.slice(s![cond_col(0)..]).to_vec(),
            )
        }
    };

    Ok(ExtractedCurve {
        slice: snapped,
        capacitance,
        conductance,
        voltage: grid.voltage.clone(),
        temperature: grid.temperature.clone(),
        frequency: frequencies.to_vec(),
    })
}

impl AdmFile {
    pub fn grid(&self) -> Result<Grid> {
        infer_grid(&self.table)
    }

    pub fn extract(&self, selection: &Selection) -> Result<ExtractedCurve> {
        extract(&self.table, &self.frequencies, selection)
    }
}

// ---------------------------------------------------------------------------
// Capacitance model
// ---------------------------------------------------------------------------

/// Equivalent circuit used to report capacitance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacitanceModel {
    /// C and G in parallel; the measured value as stored.
    #[default]
    Parallel,
    /// C and R in series, `Cp (1 + D²)`.
    Series,
}

impl FromStr for CapacitanceModel {
    type Err = AdmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "parallel" | "cp" => Ok(CapacitanceModel::Parallel),
            "series" | "cs" => Ok(CapacitanceModel::Series),
            _ => Err(AdmError::InvalidModel(s.to_string())),
        }
    }
}

impl fmt::Display for CapacitanceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapacitanceModel::Parallel => write!(f, "parallel"),
            CapacitanceModel::Series => write!(f, "series"),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::data::model::table_from_rows;

    const FREQS: [f64; 2] = [100.0, 1000.0];
    const TEMPS: [f64; 2] = [100.0, 200.0];
    const VOLTS: [f64; 3] = [0.0, 0.5, 1.0];

    /// Cell value encodes its position: `100 * block + 10 * voltage index + column`.
    fn grid_table() -> RawTable {
        let mut rows = Vec::new();
        for (b, &t) in TEMPS.iter().enumerate() {
            for (i, &v) in VOLTS.iter().enumerate() {
                let mut row = vec![t, v];
                for col in 2..6 {
                    row.push((100 * b + 10 * i + col) as f64);
                }
                rows.push(row);
            }
        }
        table_from_rows(rows).unwrap()
    }

    fn run(selection: Selection) -> Result<ExtractedCurve> {
        extract(&grid_table(), &FREQS, &selection)
    }

    #[test]
    fn curve_over_voltage() {
        let curve = run(Selection::new().with_frequency(1000.0).with_temperature(190.0)).unwrap();
        assert_eq!(
            curve.slice,
            Slice::OverVoltage {
                frequency: 1000.0,
                temperature: 200.0
            }
        );
        assert_eq!(curve.capacitance, vec![103.0, 113.0, 123.0]);
        assert_eq!(curve.conductance, vec![105.0, 115.0, 125.0]);
        assert_eq!(curve.sweep_axis(), &VOLTS);
        assert_eq!(curve.temperature, TEMPS.to_vec());
    }

    #[test]
    fn curve_over_temperature() {
        let curve = run(Selection::new().with_frequency(120.0).with_voltage(0.45)).unwrap();
        assert_eq!(
            curve.slice,
            Slice::OverTemperature {
                frequency: 100.0,
                voltage: 0.5
            }
        );
        assert_eq!(curve.capacitance, vec![12.0, 112.0]);
        assert_eq!(curve.conductance, vec![14.0, 114.0]);
        assert_eq!(curve.sweep_axis(), &TEMPS);
    }

    #[test]
    fn curve_over_frequency() {
        let curve = run(Selection::new().with_voltage(1.0).with_temperature(100.0)).unwrap();
        assert_eq!(curve.capacitance, vec![22.0, 23.0]);
        assert_eq!(curve.conductance, vec![24.0, 25.0]);
        assert_eq!(curve.sweep_axis(), &FREQS);
    }

    #[test]
    fn exact_voltage_has_zero_residual() {
        let curve = run(Selection::new().with_voltage(0.5).with_temperature(200.0)).unwrap();
        match curve.slice {
            Slice::OverFrequency { voltage, .. } => assert_eq!(voltage, 0.5),
            other => panic!("unexpected slice {other:?}"),
        }
        assert_eq!(curve.capacitance, vec![112.0, 113.0]);
    }

    #[test]
    fn ties_pick_the_lowest_index() {
        assert_eq!(nearest(&VOLTS, 0.25), 0);
        assert_eq!(nearest(&VOLTS, 0.75), 1);
        assert_eq!(nearest(&[3.0], -100.0), 0);
    }

    #[test]
    fn zero_selectors_are_values() {
        let curve = run(Selection::new().with_frequency(0.0).with_voltage(0.0)).unwrap();
        assert_eq!(curve.capacitance, vec![2.0, 102.0]);
    }

    #[test]
    fn one_selector_is_not_enough() {
        let err = run(Selection::new().with_frequency(100.0)).unwrap_err();
        assert!(matches!(err, AdmError::InsufficientSelectors));
        let err = run(Selection::new()).unwrap_err();
        assert!(matches!(err, AdmError::InsufficientSelectors));
    }

    #[test]
    fn three_selectors_are_too_many() {
        let selection = Selection::new()
            .with_frequency(100.0)
            .with_voltage(0.0)
            .with_temperature(100.0);
        assert!(matches!(run(selection), Err(AdmError::OverSpecified)));
    }

    #[test]
    fn single_frequency_is_filled_in() {
        let table = table_from_rows(vec![
            vec![10.0, 0.0, 1.0, 5.0],
            vec![10.0, 1.0, 2.0, 6.0],
            vec![20.0, 0.0, 3.0, 7.0],
            vec![20.0, 1.0, 4.0, 8.0],
        ])
        .unwrap();
        let curve = extract(&table, &[1e6], &Selection::new().with_temperature(20.0)).unwrap();
        assert_eq!(
            curve.slice,
            Slice::OverVoltage {
                frequency: 1e6,
                temperature: 20.0
            }
        );
        assert_eq!(curve.capacitance, vec![3.0, 4.0]);
    }

    #[test]
    fn single_temperature_is_filled_in() {
        let table = table_from_rows(vec![
            vec![300.0, 0.0, 1.0, 2.0, 5.0, 6.0],
            vec![300.0, 1.0, 3.0, 4.0, 7.0, 8.0],
        ])
        .unwrap();
        let curve = extract(&table, &FREQS, &Selection::new().with_frequency(100.0)).unwrap();
        assert_eq!(curve.temperature, vec![300.0]);
        assert_eq!(curve.capacitance, vec![1.0, 3.0]);

        // frequency and voltage given: the curve runs over the lone temperature
        let point = extract(
            &table,
            &FREQS,
            &Selection::new().with_frequency(1000.0).with_voltage(1.0),
        )
        .unwrap();
        assert_eq!(point.slice.axis_name(), "temperature");
        assert_eq!(point.capacitance, vec![4.0]);
        assert_eq!(point.conductance, vec![8.0]);
    }

    #[test]
    fn series_capacitance_from_dissipation() {
        let cap = 1e-9;
        let curve = ExtractedCurve {
            slice: Slice::OverVoltage {
                frequency: 100.0,
                temperature: 300.0,
            },
            capacitance: vec![cap],
            conductance: vec![0.5 * angular_frequency(100.0) * cap],
            voltage: vec![0.0],
            temperature: vec![300.0],
            frequency: vec![100.0],
        };
        assert_relative_eq!(curve.dissipation()[0], 0.5, max_relative = 1e-12);
        assert_relative_eq!(curve.series_capacitance()[0], 1.25e-9, max_relative = 1e-12);
        assert_eq!(curve.capacitance(CapacitanceModel::Parallel), vec![cap]);
    }

    #[test]
    fn frequency_curve_uses_each_frequency_for_dissipation() {
        let curve = ExtractedCurve {
            slice: Slice::OverFrequency {
                voltage: 0.0,
                temperature: 300.0,
            },
            capacitance: vec![1e-9, 1e-9],
            conductance: vec![angular_frequency(10.0) * 1e-9, angular_frequency(10.0) * 1e-9],
            voltage: vec![0.0],
            temperature: vec![300.0],
            frequency: vec![10.0, 20.0],
        };
        let d = curve.dissipation();
        assert_relative_eq!(d[0], 1.0, max_relative = 1e-12);
        assert_relative_eq!(d[1], 0.5, max_relative = 1e-12);
    }

    #[test]
    fn grid_of_another_table_is_rejected() {
        let grid = infer_grid(&grid_table()).unwrap();
        let short = table_from_rows(vec![vec![100.0, 0.0, 1.0, 2.0, 3.0, 4.0]]).unwrap();
        let slice = Slice::OverVoltage {
            frequency: 100.0,
            temperature: 200.0,
        };
        let err = extract_slice(&short, &FREQS, &grid, slice).unwrap_err();
        assert!(matches!(err, AdmError::IrregularGrid(_)));
    }

    #[test]
    fn empty_grid_is_rejected() {
        let grid = Grid {
            voltage: Vec::new(),
            temperature: vec![100.0],
            single_temperature: true,
        };
        let slice = Slice::OverFrequency {
            voltage: 0.0,
            temperature: 100.0,
        };
        let err = extract_slice(&grid_table(), &FREQS, &grid, slice).unwrap_err();
        assert!(matches!(err, AdmError::IrregularGrid(_)));
    }

    #[test]
    fn hand_built_grid_matching_the_table() {
        let grid = Grid {
            voltage: VOLTS.to_vec(),
            temperature: TEMPS.to_vec(),
            single_temperature: false,
        };
        let slice = Slice::OverTemperature {
            frequency: 1000.0,
            voltage: 1.0,
        };
        let curve = extract_slice(&grid_table(), &FREQS, &grid, slice).unwrap();
        assert_eq!(curve.capacitance, vec![23.0, 123.0]);
    }

    #[test]
    fn model_names() {
        assert_eq!("Series".parse::<CapacitanceModel>().unwrap(), CapacitanceModel::Series);
        assert_eq!("cp".parse::<CapacitanceModel>().unwrap(), CapacitanceModel::Parallel);
        let err = "ideal".parse::<CapacitanceModel>().unwrap_err();
        assert!(matches!(err, AdmError::InvalidModel(ref m) if m == "ideal"));
    }
}
