//! Doping concentration profile from a C–V curve.
//!
//! For a one-sided junction the depletion capacitance obeys
//! `N = C³ / (e ε₀ εr A² dC/dV)` and the depletion width `w = ε₀ εr A / C`.
//! Both are evaluated between adjacent samples using a finite-difference
//! slope and the midpoint capacitance.

use serde::Serialize;

use crate::constants::{CM_TO_NM, ELEMENTARY_CHARGE, VACUUM_PERMITTIVITY};
use crate::error::{AdmError, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DopingProfile {
    /// Doping concentration in cm⁻³, one value per adjacent sample pair.
    /// The sign follows the sweep direction and the slope of the curve.
    pub concentration: Vec<f64>,
    /// Depletion width in nanometres at the midpoint capacitance.
    pub width: Vec<f64>,
}

impl DopingProfile {
    /// Compute the profile from capacitance `cap` (F) against bias `volt` (V)
    /// for a contact of `area` cm² and relative permittivity `epsilon`.
    ///
    /// The output has one point fewer than the input. The sweep should be
    /// monotonic in voltage; a repeated voltage produces an infinite slope.
    pub fn from_cv(cap: &[f64], volt: &[f64], area: f64, epsilon: f64) -> Result<Self> {
        if cap.len() != volt.len() {
            return Err(AdmError::InvalidSweep(format!(
                "{} capacitance values for {} voltages",
                cap.len(),
                volt.len()
            )));
        }
        if cap.len() < 2 {
            return Err(AdmError::InvalidSweep(format!(
                "need at least 2 points, got {}",
                cap.len()
            )));
        }

        let permittivity = VACUUM_PERMITTIVITY * epsilon;
        let (concentration, width): (Vec<f64>, Vec<f64>) = cap
            .windows(2)
            .zip(volt.windows(2))
            .map(|(c, v)| {
                let slope = (c[1] - c[0]) / (v[1] - v[0]);
                let c_mid = (c[1] + c[0]) / 2.0;
                let n = c_mid.powi(3) / (slope * ELEMENTARY_CHARGE * permittivity * area * area);
                let w = CM_TO_NM * permittivity * area / c_mid;
                (n, w)
            })
            .unzip();

        Ok(DopingProfile {
            concentration,
            width,
        })
    }

    pub fn len(&self) -> usize {
        self.concentration.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concentration.is_empty()
    }
}
