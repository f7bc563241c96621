//! Mock converter for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::converter::{ConversionOutput, Converter, ConverterError, TargetFormat};

/// Bytes written per output when output writing is enabled.
const MOCK_OUTPUT: &[u8] = b"mock-audio-output";

/// A recorded conversion for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedConversion {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub format: TargetFormat,
    pub success: bool,
}

/// In-memory [`Converter`] with controllable behavior.
///
/// - records every conversion it is asked to perform
/// - fails or panics for chosen inputs
/// - sleeps for a configurable duration to simulate work
/// - tracks how many conversions overlap in time
///
/// Clones share state, so a test can keep one handle while the runner owns
/// another.
///
/// # Example
///
/// ```rust,ignore
/// use audioconv_core::testing::MockConverter;
///
/// let converter = MockConverter::new();
/// converter.fail_input("/in/broken.wav", "corrupt frame").await;
///
/// // ... run a batch ...
///
/// assert_eq!(converter.conversion_count().await, 3);
/// assert!(converter.max_in_flight() <= 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockConverter {
    conversions: Arc<RwLock<Vec<RecordedConversion>>>,
    failures: Arc<RwLock<HashMap<PathBuf, String>>>,
    panics: Arc<RwLock<HashSet<PathBuf>>>,
    next_error: Arc<RwLock<Option<ConverterError>>>,
    conversion_duration_ms: Arc<RwLock<u64>>,
    write_outputs: Arc<RwLock<bool>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl Default for MockConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConverter {
    /// Create a mock that succeeds instantly for every input.
    pub fn new() -> Self {
        Self {
            conversions: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            panics: Arc::new(RwLock::new(HashSet::new())),
            next_error: Arc::new(RwLock::new(None)),
            conversion_duration_ms: Arc::new(RwLock::new(0)),
            write_outputs: Arc::new(RwLock::new(false)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn recorded_conversions(&self) -> Vec<RecordedConversion> {
        self.conversions.read().await.clone()
    }

    pub async fn clear_recorded(&self) {
        self.conversions.write().await.clear();
        self.max_in_flight.store(0, Ordering::SeqCst);
    }

    /// Number of conversions started, successful or not.
    pub async fn conversion_count(&self) -> usize {
        self.conversions.read().await.len()
    }

    /// Fail every conversion of `input` with `reason`.
    pub async fn fail_input(&self, input: impl AsRef<Path>, reason: &str) {
        self.failures
            .write()
            .await
            .insert(input.as_ref().to_path_buf(), reason.to_string());
    }

    /// Panic inside the converter when asked to convert `input`.
    pub async fn panic_on(&self, input: impl AsRef<Path>) {
        self.panics.write().await.insert(input.as_ref().to_path_buf());
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: ConverterError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn set_conversion_duration(&self, duration: Duration) {
        *self.conversion_duration_ms.write().await = duration.as_millis() as u64;
    }

    /// Write a small file at each output path on success.
    pub async fn set_write_outputs(&self, write: bool) {
        *self.write_outputs.write().await = write;
    }

    /// Conversions currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of conversions that ran at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn take_error(&self) -> Option<ConverterError> {
        self.next_error.write().await.take()
    }

    async fn simulate(&self, input: &Path, output: &Path) -> Result<u64, ConverterError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let duration_ms = *self.conversion_duration_ms.read().await;
        if duration_ms > 0 {
            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
        }

        if let Some(reason) = self.failures.read().await.get(input) {
            return Err(ConverterError::conversion_failed(reason.clone(), None));
        }

        if *self.write_outputs.read().await {
            if let Some(parent) = output.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(output, MOCK_OUTPUT).await?;
        }
        Ok(MOCK_OUTPUT.len() as u64)
    }
}

/// Decrements the in-flight counter however the conversion ends.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        format: TargetFormat,
    ) -> Result<ConversionOutput, ConverterError> {
        if self.panics.read().await.contains(input) {
            panic!("mock converter panic for {}", input.display());
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        let outcome = self.simulate(input, output).await;

        self.conversions.write().await.push(RecordedConversion {
            input_path: input.to_path_buf(),
            output_path: output.to_path_buf(),
            format,
            success: outcome.is_ok(),
        });

        outcome.map(|size| ConversionOutput {
            output_path: output.to_path_buf(),
            output_size_bytes: size,
        })
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        Ok(())
    }
}
