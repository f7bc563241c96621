//! Plain-text rendering of run results.

use std::fmt::Write;
use std::time::Duration;

use audioconv_core::{ComplexityReport, CpuTopology, RunSummary, WorkloadProfile};

pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} run ({} worker{}) to {}: {} succeeded, {} failed, {} not run of {} in {}",
        summary.mode,
        summary.worker_count,
        if summary.worker_count == 1 { "" } else { "s" },
        summary.target_format,
        summary.succeeded,
        summary.failed,
        summary.not_run,
        summary.total,
        format_duration(summary.elapsed),
    );

    let failures: Vec<_> = summary.failures().collect();
    if !failures.is_empty() {
        let _ = writeln!(out, "\nFailures:");
        for result in failures {
            if let Some(error) = result.error() {
                let _ = writeln!(out, "  {}: {}", result.file_name(), error);
            }
        }
    }

    let timings = summary.timings_slowest_first();
    if !timings.is_empty() {
        let width = timings.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
        let _ = writeln!(out, "\nConversion times (slowest first):");
        for (name, elapsed) in timings {
            let _ = writeln!(out, "  {:<width$}  {:>9}", name, format_duration(elapsed));
        }
    }
    out
}

pub fn render_analysis(
    profile: &WorkloadProfile,
    complexity: &ComplexityReport,
    topology: &CpuTopology,
    workers: usize,
    speedup: f64,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", topology);
    let _ = writeln!(
        out,
        "{} file(s), {:.1} MB average",
        profile.file_count, profile.avg_size_mb
    );
    let _ = writeln!(out, "{}", complexity);
    let _ = writeln!(out, "Expected speedup on {} workers: {:.2}x", workers, speedup);
    if topology.shares_cores(workers) {
        let _ = writeln!(
            out,
            "Note: {} workers exceed {} physical core(s)",
            workers, topology.physical
        );
    }
    out
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 1.0 {
        format!("{}ms", duration.as_millis())
    } else {
        format!("{:.2}s", secs)
    }
}
