//! Test doubles for the converter seam.
//!
//! [`MockConverter`] stands in for FFmpeg so runs can be exercised end to end
//! without any external tool installed.

mod mock_converter;

pub use mock_converter::{MockConverter, RecordedConversion};
