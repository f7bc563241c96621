//! Trait definitions for the converter module.

use async_trait::async_trait;
use std::path::Path;

use super::error::ConverterError;
use super::types::{ConversionOutput, TargetFormat};

/// A converter that can transcode one audio file into a target format.
///
/// Implementations are treated as opaque by the runners: a call either
/// writes `output` and returns `Ok`, or fails with a reason. The call may
/// take arbitrarily long; the runners never interrupt one midway.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Converts `input` into `format`, writing the result to `output`.
    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        format: TargetFormat,
    ) -> Result<ConversionOutput, ConverterError>;

    /// Validates that the converter is properly configured and ready.
    async fn validate(&self) -> Result<(), ConverterError>;
}
