//! Error types for the DSP primitives

use thiserror::Error;

/// DSP primitive errors
#[derive(Error, Debug)]
pub enum DspError {
    #[error("resampling failed: {0}")]
    Resample(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type for DSP operations
pub type DspResult<T> = Result<T, DspError>;
