mod args;
mod report;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use audioconv_core::{
    amdahl_speedup, available_workers, load_config, metrics, validate_config, AppConfig,
    BatchConverter, Converter, CpuTopology, FfmpegConverter, ProgressReporter, RunMode,
    StopHandle, WorkloadProfile,
};

use args::Cli;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether every job succeeded.
async fn run() -> Result<bool> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => {
            let mut config = AppConfig::default();
            config.run.worker_count = available_workers();
            config
        }
    };
    validate_config(&config).context("Configuration validation failed")?;

    let request = cli.to_request(&config.run);

    if cli.analyze {
        let profile = WorkloadProfile::measure(&request.input_paths);
        let workers = match request.mode {
            RunMode::Sequential => 1,
            RunMode::Parallel => request.worker_count.max(1),
        };
        let complexity = profile.complexity(request.mode, workers);
        let speedup = amdahl_speedup(workers, cli.serial_fraction)
            .context("Invalid speedup parameters")?;
        print!(
            "{}",
            report::render_analysis(
                &profile,
                &complexity,
                &CpuTopology::detect(),
                workers,
                speedup,
            )
        );
        return Ok(true);
    }

    let converter = FfmpegConverter::new(config.converter.clone());
    converter
        .validate()
        .await
        .context("FFmpeg is not available")?;

    let batch = BatchConverter::new(converter).with_result_buffer(config.run.result_buffer);
    let stop_task = tokio::spawn(stop_on_signal(batch.stop_handle()));

    let mut reporter = ProgressReporter::new();
    let watcher = reporter.watcher();
    let bar = progress_bar(request.input_paths.len() as u64, cli.no_progress || cli.json);

    let bar_handle = bar.clone();
    let outcome = batch
        .run(&request, &mut reporter, move |result| {
            let snapshot = watcher.snapshot();
            bar_handle.set_position(snapshot.reported() as u64);
            let status = if result.is_success() {
                "ok"
            } else if result.is_failure() {
                "failed"
            } else {
                "skipped"
            };
            bar_handle.set_message(format!("{} {}", status, result.file_name()));
        })
        .await;
    bar.finish_and_clear();
    stop_task.abort();

    let summary = outcome.context("Run rejected")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to encode summary")?
        );
    } else {
        print!("{}", report::render_summary(&summary));
    }

    if cli.metrics {
        print!("{}", metrics::render_metrics());
    }

    if !summary.is_success() {
        warn!(
            failed = summary.failed,
            not_run = summary.not_run,
            "Run finished with unconverted files"
        );
    }
    Ok(summary.is_success())
}

fn progress_bar(total: u64, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total);
    bar.set_draw_target(ProgressDrawTarget::stderr());
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Requests a cooperative stop on Ctrl+C (or SIGTERM on unix).
async fn stop_on_signal(stop: StopHandle) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Interrupt received; finishing in-flight conversions");
    stop.stop();
}
