//! Errors associated with writing OIFITS tables.

use thiserror::Error;

use crate::{dataset::ConsistencyError, model::MeasurementKind, table::StoreError};

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Refusing to write an inconsistent dataset: {0}")]
    Inconsistent(#[from] ConsistencyError),

    #[error("{kind} measurement {index}: {quantity} has {len} elements but its wavelength table has {expected} channels")]
    ChannelLength {
        kind: MeasurementKind,
        index: usize,
        quantity: &'static str,
        len: usize,
        expected: usize,
    },

    #[error("{what} {index} can't be represented as a 16-bit integer")]
    IndexOverflow { what: &'static str, index: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}
