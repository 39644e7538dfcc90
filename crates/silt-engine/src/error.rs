//! Error types for the processing engine

use thiserror::Error;

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("cannot read input audio: {0}")]
    InputRead(String),

    #[error("cannot write output: {0}")]
    OutputWrite(String),

    #[error("invalid noise profile: {0}")]
    ProfileMismatch(String),

    #[error("resampling failed: {0}")]
    Resample(String),

    #[error("stage failed: {0}")]
    Stage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

impl From<silt_dsp::DspError> for EngineError {
    fn from(err: silt_dsp::DspError) -> Self {
        match err {
            silt_dsp::DspError::Resample(msg) => EngineError::Resample(msg),
            other => EngineError::Stage(other.to_string()),
        }
    }
}
