//! Run lifecycle integration tests.
//!
//! These tests drive whole runs through `BatchConverter` with the mock
//! converter and real temp directories:
//! - One result per input in both modes
//! - Ordering and pool-size guarantees
//! - Output naming and collisions
//! - Request validation and cooperative stop

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use audioconv_core::{
    converter::ConverterConfig,
    testing::MockConverter,
    BatchConverter, ConversionResult, FfmpegConverter, JobError, ProgressReporter, RunError,
    RunMode, RunRequest, RunState,
};

/// Test helper owning the mock converter and the input/output directories.
struct TestHarness {
    batch: BatchConverter<MockConverter>,
    converter: MockConverter,
    input_dir: TempDir,
    output_dir: TempDir,
}

impl TestHarness {
    async fn new() -> Self {
        let converter = MockConverter::new();
        converter.set_conversion_duration(Duration::from_millis(10)).await;
        converter.set_write_outputs(true).await;

        Self {
            batch: BatchConverter::new(converter.clone()),
            converter,
            input_dir: TempDir::new().expect("Failed to create input dir"),
            output_dir: TempDir::new().expect("Failed to create output dir"),
        }
    }

    /// Creates `count` input files named `track00.wav`, `track01.wav`, ...
    fn create_inputs(&self, count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| self.create_input(&format!("track{:02}.wav", i)))
            .collect()
    }

    fn create_input(&self, relative: &str) -> PathBuf {
        let path = self.input_dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, b"RIFF....WAVEfmt ").unwrap();
        path
    }

    fn request(&self, mode: RunMode, workers: usize, format: &str, inputs: Vec<PathBuf>) -> RunRequest {
        RunRequest {
            mode,
            worker_count: workers,
            target_format: format.to_string(),
            output_directory: self.output_dir.path().to_path_buf(),
            input_paths: inputs,
        }
    }
}

#[tokio::test]
async fn test_sequential_run_reports_every_input_in_order() {
    let harness = TestHarness::new().await;
    let mut inputs = harness.create_inputs(5);
    inputs.push(harness.input_dir.path().join("ghost.wav"));
    harness.converter.fail_input(&inputs[2], "unsupported sample rate").await;

    let mut reporter = ProgressReporter::new();
    let mut delivered = Vec::new();
    let summary = harness
        .batch
        .run(
            &harness.request(RunMode::Sequential, 1, "mp3", inputs),
            &mut reporter,
            |r| delivered.push(r.index),
        )
        .await
        .unwrap();

    assert_eq!(delivered, vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(summary.total, 6);
    assert_eq!(summary.succeeded, 4);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.succeeded + summary.failed + summary.not_run, summary.total);
    assert_eq!(
        summary.results[2].error(),
        Some(&JobError::ConversionFailed {
            reason: "unsupported sample rate".to_string()
        })
    );
    assert!(matches!(
        summary.results[5].error(),
        Some(JobError::InputNotFound { .. })
    ));
    assert_eq!(harness.converter.max_in_flight(), 1);

    let snapshot = reporter.snapshot();
    assert_eq!(snapshot.state, RunState::Completed);
    assert_eq!(snapshot.completed, 6);
    assert_eq!(snapshot.failed, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_run_never_exceeds_pool_size() {
    let harness = TestHarness::new().await;
    harness
        .converter
        .set_conversion_duration(Duration::from_millis(30))
        .await;
    let inputs = harness.create_inputs(10);

    let mut reporter = ProgressReporter::new();
    let summary = harness
        .batch
        .run(
            &harness.request(RunMode::Parallel, 4, "flac", inputs),
            &mut reporter,
            |_| {},
        )
        .await
        .unwrap();

    assert_eq!(summary.total, 10);
    assert_eq!(summary.succeeded, 10);
    assert!(harness.converter.max_in_flight() <= 4);
    assert_eq!(harness.converter.conversion_count().await, 10);

    let indices: Vec<usize> = summary.results.iter().map(|r| r.index).collect();
    assert_eq!(indices, (0..10).collect::<Vec<_>>());
    assert!(summary.job_time >= Duration::from_millis(300));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_run_isolates_failures() {
    let harness = TestHarness::new().await;
    let inputs = harness.create_inputs(8);
    for input in inputs.iter().step_by(2) {
        harness.converter.fail_input(input, "decoder error").await;
    }

    let mut reporter = ProgressReporter::new();
    let summary = harness
        .batch
        .run(
            &harness.request(RunMode::Parallel, 3, "ogg", inputs),
            &mut reporter,
            |_| {},
        )
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 4);
    assert_eq!(summary.failed, 4);
    assert!(summary.results.iter().all(|r| r.is_success() == (r.index % 2 == 1)));
}

#[tokio::test]
async fn test_output_names_are_deterministic() {
    let harness = TestHarness::new().await;
    let inputs = vec![
        harness.create_input("Side A/01 Opening.wav"),
        harness.create_input("Side A/02 Theme.flac"),
    ];

    let mut outputs = Vec::new();
    for mode in [RunMode::Sequential, RunMode::Parallel] {
        let mut reporter = ProgressReporter::new();
        let summary = harness
            .batch
            .run(
                &harness.request(mode, 2, "AAC", inputs.clone()),
                &mut reporter,
                |_| {},
            )
            .await
            .unwrap();
        let paths: Vec<PathBuf> = summary.results.iter().map(|r| r.output_path.clone()).collect();
        outputs.push(paths);
    }

    assert_eq!(outputs[0], outputs[1]);
    assert_eq!(
        outputs[0],
        vec![
            harness.output_dir.path().join("01 Opening.aac"),
            harness.output_dir.path().join("02 Theme.aac"),
        ]
    );
    assert!(outputs[0].iter().all(|p| p.exists()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_naming_collision_first_input_wins() {
    for mode in [RunMode::Sequential, RunMode::Parallel] {
        let harness = TestHarness::new().await;
        let first = harness.create_input("disc1/song.wav");
        let second = harness.create_input("disc2/song.flac");

        let mut reporter = ProgressReporter::new();
        let summary = harness
            .batch
            .run(
                &harness.request(mode, 2, "mp3", vec![first.clone(), second]),
                &mut reporter,
                |_| {},
            )
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 1, "mode {}", mode);
        assert_eq!(summary.failed, 1, "mode {}", mode);
        assert!(summary.results[0].is_success());
        assert_eq!(
            summary.results[1].error(),
            Some(&JobError::OutputNamingCollision {
                output_path: harness.output_dir.path().join("song.mp3"),
                claimed_by: first,
            })
        );
        assert_eq!(harness.converter.conversion_count().await, 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unreadable_earlier_input_does_not_claim_output() {
    for mode in [RunMode::Sequential, RunMode::Parallel] {
        let harness = TestHarness::new().await;
        let missing = harness.input_dir.path().join("disc1/song.wav");
        let present = harness.create_input("disc2/song.flac");

        let mut reporter = ProgressReporter::new();
        let summary = harness
            .batch
            .run(
                &harness.request(mode, 2, "mp3", vec![missing, present.clone()]),
                &mut reporter,
                |_| {},
            )
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 1, "mode {}", mode);
        assert!(matches!(
            summary.results[0].error(),
            Some(JobError::InputNotFound { .. })
        ));
        assert!(summary.results[1].is_success(), "mode {}", mode);
        assert!(harness.output_dir.path().join("song.mp3").exists());
        assert_eq!(harness.converter.recorded_conversions().await[0].input_path, present);
    }
}

#[tokio::test]
async fn test_output_onto_input_is_rejected() {
    let harness = TestHarness::new().await;
    let input = harness.output_dir.path().join("loop.mp3");
    std::fs::write(&input, b"ID3").unwrap();

    let mut reporter = ProgressReporter::new();
    let summary = harness
        .batch
        .run(
            &harness.request(RunMode::Sequential, 1, "mp3", vec![input.clone()]),
            &mut reporter,
            |_| {},
        )
        .await
        .unwrap();

    assert_eq!(
        summary.results[0].error(),
        Some(&JobError::OutputOverwritesInput { path: input })
    );
    assert_eq!(harness.converter.conversion_count().await, 0);
}

#[tokio::test]
async fn test_unsupported_format_rejects_run_before_any_job() {
    let harness = TestHarness::new().await;
    let inputs = harness.create_inputs(3);

    let mut reporter = ProgressReporter::new();
    let mut callbacks = 0;
    let err = harness
        .batch
        .run(
            &harness.request(RunMode::Parallel, 2, "XYZ", inputs),
            &mut reporter,
            |_| callbacks += 1,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::UnsupportedFormat(ref f) if f == "XYZ"));
    assert_eq!(callbacks, 0);
    assert_eq!(harness.converter.conversion_count().await, 0);
    assert_eq!(reporter.snapshot().state, RunState::NotStarted);
}

#[tokio::test]
async fn test_invalid_requests() {
    let harness = TestHarness::new().await;
    let mut reporter = ProgressReporter::new();

    let err = harness
        .batch
        .run(
            &harness.request(RunMode::Parallel, 0, "wav", harness.create_inputs(1)),
            &mut reporter,
            |_| {},
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::InvalidWorkerCount(0)));

    let err = harness
        .batch
        .run(
            &harness.request(RunMode::Sequential, 1, "wav", vec![]),
            &mut reporter,
            |_| {},
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::NoInputs));
}

#[tokio::test]
async fn test_output_directory_is_created() {
    let harness = TestHarness::new().await;
    let nested = harness.output_dir.path().join("converted").join("2024");
    let mut request = harness.request(RunMode::Sequential, 1, "wav", harness.create_inputs(2));
    request.output_directory = nested.clone();

    let mut reporter = ProgressReporter::new();
    let summary = harness.batch.run(&request, &mut reporter, |_| {}).await.unwrap();

    assert!(nested.is_dir());
    assert!(summary.is_success());
    assert!(nested.join("track00.wav").exists());
}

#[tokio::test]
async fn test_output_directory_failure_is_run_error() {
    let harness = TestHarness::new().await;
    let blocker = harness.output_dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"x").unwrap();
    let mut request = harness.request(RunMode::Sequential, 1, "wav", harness.create_inputs(1));
    request.output_directory = blocker.join("out");

    let mut reporter = ProgressReporter::new();
    let err = harness.batch.run(&request, &mut reporter, |_| {}).await.unwrap_err();

    assert!(matches!(err, RunError::OutputDirectory { .. }));
    assert_eq!(harness.converter.conversion_count().await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stop_after_three_completions_bounds_further_work() {
    let harness = TestHarness::new().await;
    harness
        .converter
        .set_conversion_duration(Duration::from_millis(40))
        .await;
    let inputs = harness.create_inputs(10);
    let workers = 4;
    let stop = harness.batch.stop_handle();

    let mut reporter = ProgressReporter::new();
    let mut ran = 0;
    let mut ran_at_stop = None;
    let summary = harness
        .batch
        .run(
            &harness.request(RunMode::Parallel, workers, "mp3", inputs),
            &mut reporter,
            |r: &ConversionResult| {
                if !r.is_not_run() {
                    ran += 1;
                }
                if ran == 3 && ran_at_stop.is_none() {
                    ran_at_stop = Some(ran);
                    stop.stop();
                }
            },
        )
        .await
        .unwrap();

    assert_eq!(ran_at_stop, Some(3));
    assert_eq!(summary.total, 10);
    assert!(summary.succeeded >= 3);
    assert!(summary.succeeded <= 3 + workers);
    assert_eq!(summary.succeeded + summary.not_run, 10);
    assert!(summary.not_run >= 10 - 3 - workers);
    assert_eq!(harness.converter.conversion_count().await, summary.succeeded);
    assert!(summary
        .results
        .iter()
        .filter(|r| r.is_not_run())
        .all(|r| r.error().is_none() && r.elapsed == Duration::ZERO));

    let snapshot = reporter.snapshot();
    assert_eq!(snapshot.completed, summary.succeeded);
    assert_eq!(snapshot.not_run, summary.not_run);
    assert_eq!(snapshot.state, RunState::Completed);
}

#[tokio::test]
async fn test_stopped_run_does_not_affect_next_run() {
    for mode in [RunMode::Sequential, RunMode::Parallel] {
        let harness = TestHarness::new().await;
        let inputs = harness.create_inputs(2);
        let request = harness.request(mode, 1, "ogg", inputs);
        let stop = harness.batch.stop_handle();

        let mut reporter = ProgressReporter::new();
        let first = harness
            .batch
            .run(&request, &mut reporter, |_| stop.stop())
            .await
            .unwrap();
        assert_eq!(first.succeeded, 1, "mode {}", mode);
        assert_eq!(first.not_run, 1, "mode {}", mode);

        let mut reporter = ProgressReporter::new();
        let second = harness
            .batch
            .run(&request, &mut reporter, |_| {})
            .await
            .unwrap();
        assert_eq!(second.succeeded, 2, "mode {}", mode);
        assert_eq!(second.not_run, 0, "mode {}", mode);
        assert_eq!(harness.converter.conversion_count().await, 3);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_watchers_see_consistent_snapshots() {
    let harness = TestHarness::new().await;
    let inputs = harness.create_inputs(12);
    harness.converter.fail_input(&inputs[5], "truncated").await;

    let mut reporter = ProgressReporter::new();
    let mut watcher = reporter.watcher();
    let observer = tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Some(snapshot) = watcher.changed().await {
            assert_eq!(snapshot.succeeded + snapshot.failed, snapshot.completed);
            let done = snapshot.is_completed() && snapshot.total == 12;
            seen.push(snapshot.reported());
            if done {
                break;
            }
        }
        seen
    });

    let summary = harness
        .batch
        .run(
            &harness.request(RunMode::Parallel, 4, "wav", inputs),
            &mut reporter,
            |_| {},
        )
        .await
        .unwrap();

    let seen = tokio::time::timeout(Duration::from_secs(5), observer)
        .await
        .expect("observer should finish")
        .unwrap();
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(seen.last(), Some(&12));
    assert_eq!(summary.failed, 1);
}

#[tokio::test]
async fn test_missing_ffmpeg_fails_each_job_without_aborting() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("a.wav");
    std::fs::write(&input, b"RIFF").unwrap();

    let converter = FfmpegConverter::new(ConverterConfig::with_ffmpeg_path(PathBuf::from(
        "/nonexistent/bin/ffmpeg",
    )));
    let batch = BatchConverter::from_arc(Arc::new(converter));
    let request = RunRequest {
        mode: RunMode::Sequential,
        worker_count: 1,
        target_format: "mp3".to_string(),
        output_directory: dir.path().join("out"),
        input_paths: vec![input.clone(), input],
    };

    let mut reporter = ProgressReporter::new();
    let summary = batch.run(&request, &mut reporter, |_| {}).await.unwrap();

    assert_eq!(summary.total, 2);
    assert_eq!(summary.failed, 2);
    assert!(matches!(
        summary.results[0].error(),
        Some(JobError::ConversionFailed { .. })
    ));
}
