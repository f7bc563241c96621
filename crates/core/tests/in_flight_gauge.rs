//! The in-flight gauge is process-global, so this check lives in its own
//! test binary.

use tempfile::TempDir;

use audioconv_core::{
    metrics, testing::MockConverter, BatchConverter, JobError, ProgressReporter, RunMode,
    RunRequest,
};

#[tokio::test]
async fn test_in_flight_gauge_recovers_from_panicking_converter() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("crash.wav");
    std::fs::write(&input, b"RIFF").unwrap();

    let converter = MockConverter::new();
    converter.panic_on(&input).await;
    let batch = BatchConverter::new(converter);
    let request = RunRequest {
        mode: RunMode::Parallel,
        worker_count: 1,
        target_format: "flac".to_string(),
        output_directory: dir.path().join("out"),
        input_paths: vec![input],
    };

    let before = metrics::CONVERSIONS_IN_FLIGHT.get();
    let mut reporter = ProgressReporter::new();
    let summary = batch.run(&request, &mut reporter, |_| {}).await.unwrap();

    assert_eq!(summary.results[0].error(), Some(&JobError::WorkerLost));
    assert_eq!(metrics::CONVERSIONS_IN_FLIGHT.get(), before);
}
