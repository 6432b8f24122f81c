//! Reader for admittance measurement files (capacitance and conductance
//! against frequency, bias voltage and temperature) and extraction of
//! C–V, C–T and C–f curves from them.
//!
//! ```no_run
//! use admproc::{read_path, Selection};
//!
//! let adm = read_path("sample.dat")?;
//! let cv = adm.extract(&Selection::new().with_frequency(1e5).with_temperature(300.0))?;
//! println!("{:?}", cv.capacitance);
//! # Ok::<(), admproc::AdmError>(())
//! ```

pub mod constants;
pub mod data;
pub mod doping;
pub mod error;
pub mod session;

pub use data::grid::{infer_grid, Grid};
pub use data::header::{parse_header, Header};
pub use data::loader::{read, read_path, Source};
pub use data::model::{table_from_rows, AdmFile, Metadata, RawTable};
pub use data::slice::{extract, extract_slice, CapacitanceModel, ExtractedCurve, Selection, Slice};
pub use doping::DopingProfile;
pub use error::{AdmError, Result};
pub use session::MeasurementSession;
