use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::converter::ConverterConfig;
use crate::run::{RunMode, RunRequest, DEFAULT_RESULT_BUFFER};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub run: RunDefaults,
}

/// Defaults for runs started without explicit options
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunDefaults {
    #[serde(default)]
    pub mode: RunMode,
    /// Pool size for parallel runs
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default = "default_target_format")]
    pub target_format: String,
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,
    /// Capacity of the channel between workers and the result consumer
    #[serde(default = "default_result_buffer")]
    pub result_buffer: usize,
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            worker_count: default_worker_count(),
            target_format: default_target_format(),
            output_directory: default_output_directory(),
            result_buffer: default_result_buffer(),
        }
    }
}

impl RunDefaults {
    /// Builds a request for `inputs` using these defaults.
    pub fn to_request(&self, input_paths: Vec<PathBuf>) -> RunRequest {
        RunRequest {
            mode: self.mode,
            worker_count: self.worker_count,
            target_format: self.target_format.clone(),
            output_directory: self.output_directory.clone(),
            input_paths,
        }
    }
}

fn default_worker_count() -> usize {
    4
}

fn default_target_format() -> String {
    "mp3".to_string()
}

fn default_output_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_result_buffer() -> usize {
    DEFAULT_RESULT_BUFFER
}
