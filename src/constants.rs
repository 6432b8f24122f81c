//! Physical constants in the units used by admittance files.
//!
//! Capacitance is stored in farads and contact area in cm², so the vacuum
//! permittivity is expressed per centimetre. The values are the CODATA 2010
//! figures the measurement software was calibrated against.

/// Elementary charge _e_ in coulombs (C).
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_565e-19;

/// Vacuum permittivity ε₀ in farads per centimetre (F/cm).
pub const VACUUM_PERMITTIVITY: f64 = 8.854_187_817e-14;

/// Relative permittivity of silicon, used when a file header carries none.
pub const DEFAULT_PERMITTIVITY: f64 = 11.7;

/// Centimetres to nanometres.
pub const CM_TO_NM: f64 = 1.0e7;

/// Returns the angular frequency corresponding to a linear frequency `hz`.
#[inline]
#[must_use]
pub fn angular_frequency(hz: f64) -> f64 {
    2.0 * std::f64::consts::PI * hz
}
