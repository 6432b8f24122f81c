use log::warn;

use crate::constants::DEFAULT_PERMITTIVITY;
use crate::data::grid::Grid;
use crate::data::loader::{read, Source};
use crate::data::model::{AdmFile, Metadata};
use crate::data::slice::{CapacitanceModel, ExtractedCurve, Selection, Slice};
use crate::doping::DopingProfile;
use crate::error::{AdmError, Result};

// ---------------------------------------------------------------------------
// Measurement session
// ---------------------------------------------------------------------------

/// One admittance file plus the selectors used last.
///
/// Each call merges its selectors into the remembered ones, so a C–V curve
/// at a new temperature only needs the temperature.
pub struct MeasurementSession {
    file: AdmFile,
    selection: Selection,
    last_curve: Option<ExtractedCurve>,
}

impl MeasurementSession {
    /// Read a file and start a session on it.
    pub fn open(source: Source<'_>) -> Result<Self> {
        Ok(Self::from_file(read(source)?))
    }

    pub fn from_file(file: AdmFile) -> Self {
        Self {
            file,
            selection: Selection::default(),
            last_curve: None,
        }
    }

    pub fn file(&self) -> &AdmFile {
        &self.file
    }

    pub fn metadata(&self) -> Metadata {
        self.file.metadata
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.file.frequencies
    }

    pub fn grid(&self) -> Result<Grid> {
        self.file.grid()
    }

    /// Selectors remembered from previous calls.
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Forget remembered selectors, e.g. to switch from a C–V to a C–T curve.
    pub fn clear_selection(&mut self) {
        self.selection = Selection::default();
    }

    /// Merge `selection` into the remembered selectors and extract.
    pub fn extract(&mut self, selection: Selection) -> Result<&ExtractedCurve> {
        self.selection.merge(selection);
        let curve = self.file.extract(&self.selection)?;
        Ok(self.last_curve.insert(curve))
    }

    pub fn last_curve(&self) -> Option<&ExtractedCurve> {
        self.last_curve.as_ref()
    }

    /// Dissipation factor of the last extracted curve.
    pub fn dissipation(&self) -> Option<Vec<f64>> {
        self.last_curve.as_ref().map(ExtractedCurve::dissipation)
    }

    pub fn capacitance(&mut self, model: CapacitanceModel, selection: Selection) -> Result<Vec<f64>> {
        Ok(self.extract(selection)?.capacitance(model))
    }

    /// Parallel capacitance.
    pub fn cp(&mut self, selection: Selection) -> Result<Vec<f64>> {
        self.capacitance(CapacitanceModel::Parallel, selection)
    }

    /// Series capacitance.
    pub fn cs(&mut self, selection: Selection) -> Result<Vec<f64>> {
        self.capacitance(CapacitanceModel::Series, selection)
    }

    /// Doping profile of the C–V curve described by `selection`, using the
    /// contact area and permittivity from the file header.
    pub fn doping_profile(&mut self, selection: Selection) -> Result<DopingProfile> {
        let Metadata { area, epsilon } = self.file.metadata;
        if area <= 0.0 {
            return Err(AdmError::MissingMetadata("a contact area"));
        }
        let epsilon = if epsilon > 0.0 {
            epsilon
        } else {
            warn!("no permittivity in header, assuming {DEFAULT_PERMITTIVITY}");
            DEFAULT_PERMITTIVITY
        };

        let curve = self.extract(selection)?;
        if !matches!(curve.slice, Slice::OverVoltage { .. }) {
            return Err(AdmError::InvalidSweep(format!(
                "doping profile needs a curve over voltage, got one over {}",
                curve.slice.axis_name()
            )));
        }
        DopingProfile::from_cv(&curve.capacitance, &curve.voltage, area, epsilon)
    }
}
