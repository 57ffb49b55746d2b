//! Errors associated with table stores.

use std::path::Path;

use thiserror::Error;

/// Failures to read or write the underlying storage.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{fits_filename} doesn't exist")]
    Missing { fits_filename: Box<Path> },

    /// Error when opening or creating a fits file.
    #[error(
        "{source_file}:{source_line}:{source_column}: Couldn't open {fits_filename}: {fits_error}"
    )]
    Open {
        fits_error: Box<fitsio::errors::Error>,
        fits_filename: Box<Path>,
        source_file: &'static str,
        source_line: u32,
        source_column: u32,
    },

    /// A generic error associated with cfitsio.
    #[error(
        "{source_file}:{source_line}:{source_column}: {fits_filename} HDU {hdu_num}: {fits_error}"
    )]
    Fitsio {
        fits_error: Box<fitsio::errors::Error>,
        fits_filename: Box<Path>,
        hdu_num: usize,
        source_file: &'static str,
        source_line: u32,
        source_column: u32,
    },

    #[error("Column '{column}' has {len} elements, which isn't a multiple of its repeat count {repeat}")]
    Ragged {
        column: String,
        len: usize,
        repeat: usize,
    },

    #[error(transparent)]
    Nul(#[from] std::ffi::NulError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

/// A section doesn't have something that was asked of it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SectionError {
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
}
