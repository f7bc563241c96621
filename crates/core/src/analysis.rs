//! Workload estimates shown before a run: asymptotic cost of the chosen mode
//! and the speedup Amdahl's law predicts for a given pool size.

use serde::Serialize;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::Path;
use thiserror::Error;

use crate::run::RunMode;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Pool size assumed when the platform cannot report its parallelism.
pub const FALLBACK_WORKERS: usize = 4;

#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("Parallel unit count must be greater than 0")]
    NoParallelUnits,

    #[error("Serial fraction must be between 0 and 1, got {0}")]
    SerialFractionOutOfRange(f64),
}

/// Number of logical CPUs, or [`FALLBACK_WORKERS`] when unknown.
pub fn available_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(FALLBACK_WORKERS)
}

/// Physical cores against logical CPUs of this machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CpuTopology {
    pub physical: usize,
    pub logical: usize,
}

impl CpuTopology {
    pub fn detect() -> Self {
        Self {
            physical: num_cpus::get_physical(),
            logical: num_cpus::get(),
        }
    }

    /// Whether cores run more than one hardware thread (hyperthreading/SMT).
    pub fn smt_enabled(&self) -> bool {
        self.logical > self.physical
    }

    /// Whether `workers` would put more than one worker on some physical core.
    pub fn shares_cores(&self, workers: usize) -> bool {
        workers > self.physical
    }
}

impl fmt::Display for CpuTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} physical core(s), {} logical processor(s), SMT {}",
            self.physical,
            self.logical,
            if self.smt_enabled() { "enabled" } else { "not detected" }
        )
    }
}

/// Size statistics of a set of input files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorkloadProfile {
    pub file_count: usize,
    pub total_bytes: u64,
    pub avg_size_mb: f64,
}

/// Human-readable cost estimates for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplexityReport {
    pub time: String,
    pub space: String,
    pub io: String,
}

impl fmt::Display for ComplexityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Time complexity:  {}", self.time)?;
        writeln!(f, "Space complexity: {}", self.space)?;
        write!(f, "I/O complexity:   {}", self.io)
    }
}

impl WorkloadProfile {
    /// Measures `paths`. Files whose size cannot be read count as empty.
    pub fn measure<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut file_count = 0;
        let mut total_bytes = 0;
        for path in paths {
            file_count += 1;
            total_bytes += std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        }
        Self::from_sizes(file_count, total_bytes)
    }

    pub fn from_sizes(file_count: usize, total_bytes: u64) -> Self {
        let avg_size_mb = if file_count == 0 {
            0.0
        } else {
            total_bytes as f64 / file_count as f64 / BYTES_PER_MB
        };
        Self {
            file_count,
            total_bytes,
            avg_size_mb,
        }
    }

    /// Cost of converting this workload in `mode` with `workers` workers.
    pub fn complexity(&self, mode: RunMode, workers: usize) -> ComplexityReport {
        let n = self.file_count;
        let mb = self.avg_size_mb;
        let io = format!("O({} * {:.1}MB)", n, mb);
        match mode {
            RunMode::Sequential => ComplexityReport {
                time: format!("O({} * {:.1}MB)", n, mb),
                space: format!("O({:.1}MB)", mb),
                io,
            },
            RunMode::Parallel => {
                let p = workers.max(1);
                ComplexityReport {
                    time: format!("O({}/{} * {:.1}MB)", n, p, mb),
                    space: format!("O({} * {:.1}MB)", p, mb),
                    io,
                }
            }
        }
    }
}

/// Theoretical speedup on `parallel_units` units when `serial_fraction` of
/// the work cannot be parallelized.
pub fn amdahl_speedup(parallel_units: usize, serial_fraction: f64) -> Result<f64, AnalysisError> {
    if parallel_units == 0 {
        return Err(AnalysisError::NoParallelUnits);
    }
    if !(0.0..=1.0).contains(&serial_fraction) {
        return Err(AnalysisError::SerialFractionOutOfRange(serial_fraction));
    }
    Ok(1.0 / (serial_fraction + (1.0 - serial_fraction) / parallel_units as f64))
}

/// Fraction of total time spent in parallelizable work, in `[0, 1]`.
pub fn estimate_parallel_fraction(serial_secs: f64, parallel_secs: f64) -> f64 {
    let total = serial_secs + parallel_secs;
    if total == 0.0 {
        return 0.0;
    }
    parallel_secs / total
}
