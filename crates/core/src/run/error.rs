//! Error types for conversion runs.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::converter::ConverterError;

/// Errors that reject a whole run before any job is dispatched.
#[derive(Debug, Error)]
pub enum RunError {
    /// Target format outside the supported set.
    #[error("Unsupported target format: {0} (supported: mp3, wav, flac, ogg, aac)")]
    UnsupportedFormat(String),

    /// Parallel mode requested with zero workers.
    #[error("Invalid worker count: {0} (must be at least 1)")]
    InvalidWorkerCount(usize),

    /// More workers requested than the pool can provide.
    #[error("Worker pool exhausted: requested {requested} workers, maximum is {max}")]
    WorkerPoolExhausted { requested: usize, max: usize },

    /// No input files were given.
    #[error("No input files selected")]
    NoInputs,

    /// The output directory could not be created.
    #[error("Failed to prepare output directory {path}: {reason}")]
    OutputDirectory { path: PathBuf, reason: String },
}

/// Errors local to a single job. Recorded in that job's result.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobError {
    /// Input file does not exist.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Input exists but cannot be read.
    #[error("Input file unreadable: {path}: {reason}")]
    InputUnreadable { path: PathBuf, reason: String },

    /// The converter reported an error.
    #[error("Conversion failed: {reason}")]
    ConversionFailed { reason: String },

    /// Conversion took longer than the configured timeout.
    #[error("Conversion timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Another job in the same run already writes to this output path.
    #[error("Output naming collision: {output_path} is already produced from {claimed_by}")]
    OutputNamingCollision {
        output_path: PathBuf,
        claimed_by: PathBuf,
    },

    /// The derived output path is the input file itself.
    #[error("Output would overwrite its own input: {path}")]
    OutputOverwritesInput { path: PathBuf },

    /// The worker running this job terminated without reporting a result.
    #[error("Worker terminated before reporting a result")]
    WorkerLost,
}

impl From<ConverterError> for JobError {
    fn from(err: ConverterError) -> Self {
        match err {
            ConverterError::InputNotFound { path } => Self::InputNotFound { path },
            ConverterError::Timeout { timeout_secs } => Self::Timeout { timeout_secs },
            other => Self::ConversionFailed {
                reason: other.detail(),
            },
        }
    }
}
