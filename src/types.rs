//! Error types for the selection routines.

use ndarray_linalg::error::LinalgError;
use thiserror::Error;

pub use ndarray_linalg::{c32, c64, Lapack, Scalar};

#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("Lapack Error")]
    LinalgError(#[from] LinalgError),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Warm start requested without a previously completed search")]
    NotInitialized,
    #[error("No search has been completed on this selector")]
    NotFitted,
}

pub type Result<T> = std::result::Result<T, SelectionError>;
