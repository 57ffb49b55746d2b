//! Reading, checking, merging and writing OIFITS (v1) interferometry data.
//!
//! A [`Dataset`] owns every entity of a file (wavelength tables, targets and
//! arrays with their stations) plus the visibility, squared-visibility and
//! closure-phase measurements that refer to them through handles.

pub mod angle;
pub mod constants;
pub mod dataset;
mod error;
pub mod merge;
pub mod model;
pub mod read;
pub mod table;
pub mod time;
pub mod write;

#[cfg(test)]
mod tests;

pub use angle::Angle;
pub use dataset::{Dataset, Validation, ValidationIssue};
pub use error::OifitsError;
pub use merge::{DuplicatePolicy, MergeConfig};
pub use model::{
    ArrayDescriptor, ClosurePhase, Measurement, SquaredVisibility, Station, Target,
    Visibility, WavelengthTable,
};
pub use read::read_dataset;
pub use write::write_dataset;
