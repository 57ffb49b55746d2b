//! Errors associated with reading OIFITS tables.

use thiserror::Error;

use crate::{model::ModelError, table::SectionError};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReadError {
    #[error("{section}: Couldn't find key {key}")]
    MissingKey { section: String, key: String },

    #[error("{section}: Couldn't find column {column}")]
    MissingColumn { section: String, column: String },

    #[error("{section}: {name} isn't {expected}")]
    WrongType {
        section: String,
        name: String,
        expected: &'static str,
    },

    #[error("{section}: column {column} has {len} values, but {expected} were expected")]
    RowCount {
        section: String,
        column: String,
        len: usize,
        expected: usize,
    },

    #[error("{section}: Wavelength table '{insname}': {source}")]
    Wavelength {
        section: &'static str,
        insname: String,
        source: ModelError,
    },

    #[error("More than one {section} table has {key} = '{name}'")]
    DuplicateName {
        section: &'static str,
        key: &'static str,
        name: String,
    },

    #[error("{section}: TARGET_ID {target_id} appears more than once")]
    DuplicateTargetId {
        section: &'static str,
        target_id: i64,
    },

    #[error("{section} '{arrname}': STA_INDEX {sta_index} appears more than once")]
    DuplicateStationIndex {
        section: &'static str,
        arrname: String,
        sta_index: i64,
    },

    #[error("{section}: INSNAME '{insname}' doesn't match any wavelength table")]
    UnknownInstrument {
        section: &'static str,
        insname: String,
    },

    #[error("{section}: ARRNAME '{arrname}' doesn't match any array")]
    UnknownArray {
        section: &'static str,
        arrname: String,
    },

    #[error("{section} row {row}: TARGET_ID {target_id} doesn't match any target")]
    UnknownTarget {
        section: &'static str,
        row: usize,
        target_id: i64,
    },

    #[error("{section} row {row}: STA_INDEX {sta_index} isn't a station of array '{arrname}'")]
    UnknownStation {
        section: &'static str,
        row: usize,
        arrname: String,
        sta_index: i64,
    },

    #[error("{section} row {row}: STA_INDEX has some, but not all, stations set")]
    PartialStations { section: &'static str, row: usize },
}

impl ReadError {
    /// Whether this error is a reference that couldn't be resolved, as
    /// opposed to a malformed table.
    pub fn is_reference_error(&self) -> bool {
        matches!(
            self,
            ReadError::UnknownInstrument { .. }
                | ReadError::UnknownArray { .. }
                | ReadError::UnknownTarget { .. }
                | ReadError::UnknownStation { .. }
        )
    }
}

impl From<SectionError> for ReadError {
    fn from(e: SectionError) -> Self {
        match e {
            SectionError::MissingKey { section, key } => ReadError::MissingKey { section, key },
            SectionError::MissingColumn { section, column } => {
                ReadError::MissingColumn { section, column }
            }
            SectionError::WrongType {
                section,
                name,
                expected,
            } => ReadError::WrongType {
                section,
                name,
                expected,
            },
        }
    }
}
