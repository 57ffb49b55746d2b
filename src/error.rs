//! All of the errors this crate can produce, in one place.

use thiserror::Error;

use crate::{
    dataset::ConsistencyError, merge::MergeError, model::ModelError, read::ReadError,
    table::StoreError, write::WriteError,
};

#[derive(Error, Debug)]
pub enum OifitsError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Inconsistent(#[from] ConsistencyError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Write(#[from] WriteError),
}
