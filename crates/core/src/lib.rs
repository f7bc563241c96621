//! Batch audio conversion.
//!
//! Converts a set of audio files to one target format through an external
//! codec tool, either one file at a time or on a fixed pool of workers, and
//! reports one result per file plus aggregate progress.

pub mod analysis;
pub mod config;
pub mod converter;
pub mod metrics;
pub mod progress;
pub mod run;
pub mod testing;

pub use analysis::{
    amdahl_speedup, available_workers, estimate_parallel_fraction, AnalysisError,
    ComplexityReport, CpuTopology, WorkloadProfile,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AppConfig, ConfigError, RunDefaults,
};
pub use converter::{
    ConversionOutput, Converter, ConverterConfig, ConverterError, FfmpegConverter, TargetFormat,
};
pub use progress::{ProgressReporter, ProgressSnapshot, ProgressWatcher, RunState};
pub use run::{
    plan_run, BatchConverter, ConversionJob, ConversionResult, JobError, JobStatus,
    ParallelRunner, RunConfiguration, RunError, RunMode, RunRequest, RunSummary,
    SequentialRunner, StopHandle,
};
