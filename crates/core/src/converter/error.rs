//! Error types for the converter module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during conversion.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Requested target format is not one of the supported ones.
    #[error("Unsupported target format: {format}")]
    UnsupportedFormat { format: String },

    /// Output directory does not exist and could not be created.
    #[error("Failed to create output directory: {path}")]
    OutputDirectoryFailed { path: PathBuf },

    /// Conversion process failed.
    #[error("Conversion failed: {reason}")]
    ConversionFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// Conversion timed out.
    #[error("Conversion timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error during conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConverterError {
    /// Creates a new conversion failed error with stderr output.
    pub fn conversion_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ConversionFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Human-readable reason including the tool's stderr when it has any.
    pub fn detail(&self) -> String {
        match self {
            Self::ConversionFailed { reason, stderr } => match stderr.as_deref().map(str::trim) {
                Some(stderr) if !stderr.is_empty() => format!("{}: {}", reason, stderr),
                _ => reason.clone(),
            },
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_includes_stderr() {
        let err = ConverterError::conversion_failed(
            "FFmpeg exited with code: Some(1)",
            Some("Invalid data found when processing input\n".to_string()),
        );
        assert_eq!(
            err.detail(),
            "FFmpeg exited with code: Some(1): Invalid data found when processing input"
        );
    }

    #[test]
    fn test_detail_without_stderr() {
        let err = ConverterError::Timeout { timeout_secs: 5 };
        assert_eq!(err.detail(), "Conversion timed out after 5 seconds");

        let err = ConverterError::conversion_failed("boom", Some("   ".to_string()));
        assert_eq!(err.detail(), "boom");
    }
}
