use crate::converter::TargetFormat;

use super::{types::AppConfig, ConfigError};

/// Validate configuration
/// Currently validates:
/// - ffmpeg path is set and the timeout is non-zero
/// - the default target format is supported
/// - the result buffer can hold at least one result
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.converter.ffmpeg_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "converter.ffmpeg_path cannot be empty".to_string(),
        ));
    }

    if config.converter.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "converter.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.run.result_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "run.result_buffer cannot be 0".to_string(),
        ));
    }

    if config.run.target_format.parse::<TargetFormat>().is_err() {
        return Err(ConfigError::ValidationError(format!(
            "run.target_format '{}' is not supported",
            config.run.target_format
        )));
    }

    Ok(())
}
