//! The root aggregate owning every OIFITS entity and measurement.

mod consistency;

pub use consistency::{ConsistencyError, RefCategory, Validation, ValidationIssue};

use std::path::Path;

use indexmap::IndexMap;

use crate::{
    merge::{combine, MergeConfig, MergeError},
    model::*,
    read::read_dataset,
    table::fits::FitsStore,
    write::write_dataset,
    OifitsError,
};

/// Everything read from (or to be written to) one OIFITS file.
///
/// Measurements refer to the entities here through handles (indices), so
/// entities should be added through the `add_*` methods and never removed
/// while measurements refer to them. [`Dataset::check_consistency`] detects
/// dangling handles.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Wavelength tables keyed by instrument name (`INSNAME`). The position
    /// of a table is its [`WavelengthId`].
    pub wavelengths: IndexMap<String, WavelengthTable>,

    /// The position of a target is its [`TargetId`].
    pub targets: Vec<Target>,

    /// Arrays keyed by array name (`ARRNAME`). The position of an array is
    /// its [`ArrayId`].
    pub arrays: IndexMap<String, ArrayDescriptor>,

    pub vis: Vec<Visibility>,
    pub vis2: Vec<SquaredVisibility>,
    pub t3: Vec<ClosurePhase>,
}

impl Dataset {
    pub fn new() -> Dataset {
        Dataset::default()
    }

    /// Read an OIFITS file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Dataset, OifitsError> {
        let store = FitsStore::open(path)?;
        let dataset = read_dataset(&store)?;
        Ok(dataset)
    }

    /// Write this dataset as an OIFITS file, replacing any existing file at
    /// `path`. Nothing is written if the dataset is inconsistent.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), OifitsError> {
        let mut store = FitsStore::create(path);
        write_dataset(self, &mut store)?;
        Ok(())
    }

    /// Add a wavelength table under an instrument name. If a table already
    /// exists under that name it is replaced and keeps its handle.
    pub fn add_wavelength<S: Into<String>>(
        &mut self,
        insname: S,
        table: WavelengthTable,
    ) -> WavelengthId {
        let (index, _) = self.wavelengths.insert_full(insname.into(), table);
        WavelengthId(index)
    }

    pub fn add_target(&mut self, target: Target) -> TargetId {
        self.targets.push(target);
        TargetId(self.targets.len() - 1)
    }

    /// Add an array under an array name. If an array already exists under
    /// that name it is replaced and keeps its handle.
    pub fn add_array<S: Into<String>>(&mut self, arrname: S, array: ArrayDescriptor) -> ArrayId {
        let (index, _) = self.arrays.insert_full(arrname.into(), array);
        ArrayId(index)
    }

    pub fn wavelength(&self, id: WavelengthId) -> Option<&WavelengthTable> {
        self.wavelengths.get_index(id.0).map(|(_, w)| w)
    }

    pub fn target(&self, id: TargetId) -> Option<&Target> {
        self.targets.get(id.0)
    }

    pub fn array(&self, id: ArrayId) -> Option<&ArrayDescriptor> {
        self.arrays.get_index(id.0).map(|(_, a)| a)
    }

    pub fn station(&self, array: ArrayId, station: StationId) -> Option<&Station> {
        self.array(array).and_then(|a| a.station(station))
    }

    pub fn wavelength_id(&self, insname: &str) -> Option<WavelengthId> {
        self.wavelengths.get_index_of(insname).map(WavelengthId)
    }

    pub fn array_id(&self, arrname: &str) -> Option<ArrayId> {
        self.arrays.get_index_of(arrname).map(ArrayId)
    }

    pub fn insname(&self, id: WavelengthId) -> Option<&str> {
        self.wavelengths.get_index(id.0).map(|(k, _)| k.as_str())
    }

    pub fn arrname(&self, id: ArrayId) -> Option<&str> {
        self.arrays.get_index(id.0).map(|(k, _)| k.as_str())
    }

    /// The total number of measurements of all kinds.
    pub fn num_measurements(&self) -> usize {
        self.vis.len() + self.vis2.len() + self.t3.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelengths.is_empty()
            && self.targets.is_empty()
            && self.arrays.is_empty()
            && self.num_measurements() == 0
    }

    /// Combine this dataset with another into a new one. See
    /// [`crate::merge::combine`].
    pub fn combine(&self, other: &Dataset, config: &MergeConfig) -> Result<Dataset, MergeError> {
        combine(self, other, config)
    }
}

/// Structural equality. Unlike `IndexMap`'s own comparison, the instrument
/// and array maps are compared in order, because handles are positions.
impl PartialEq for Dataset {
    fn eq(&self, other: &Self) -> bool {
        self.wavelengths.iter().eq(other.wavelengths.iter())
            && self.targets == other.targets
            && self.arrays.iter().eq(other.arrays.iter())
            && self.vis == other.vis
            && self.vis2 == other.vis2
            && self.t3 == other.t3
    }
}
