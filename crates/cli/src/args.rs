use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use audioconv_core::{RunDefaults, RunMode, RunRequest};

/// Serial share of a run assumed by `--analyze` when none is given:
/// roughly one second of setup for every nineteen seconds of conversion.
pub const DEFAULT_SERIAL_FRACTION: f64 = 0.05;

/// Convert audio files between MP3, WAV, FLAC, OGG and AAC.
#[derive(Debug, Parser)]
#[command(name = "audioconv", version, about)]
pub struct Cli {
    /// Input audio files
    #[arg(required = true, value_name = "INPUTS")]
    pub inputs: Vec<PathBuf>,

    /// Target format (mp3, wav, flac, ogg, aac)
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Directory for converted files
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Execution strategy
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Worker pool size for parallel mode
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Print Prometheus metrics after the run
    #[arg(long)]
    pub metrics: bool,

    /// Do not draw a progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Print workload complexity and the expected speedup, then exit
    #[arg(long)]
    pub analyze: bool,

    /// Serial fraction used for the speedup estimate
    #[arg(long, value_name = "FRACTION", default_value_t = DEFAULT_SERIAL_FRACTION)]
    pub serial_fraction: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Sequential,
    Parallel,
}

impl From<ModeArg> for RunMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Sequential => RunMode::Sequential,
            ModeArg::Parallel => RunMode::Parallel,
        }
    }
}

impl Cli {
    /// Command-line options take precedence over `defaults`.
    pub fn to_request(&self, defaults: &RunDefaults) -> RunRequest {
        let mut request = defaults.to_request(self.inputs.clone());
        if let Some(mode) = self.mode {
            request.mode = mode.into();
        }
        if let Some(workers) = self.workers {
            request.worker_count = workers;
        }
        if let Some(format) = &self.format {
            request.target_format = format.clone();
        }
        if let Some(output) = &self.output {
            request.output_directory = output.clone();
        }
        request
    }
}
