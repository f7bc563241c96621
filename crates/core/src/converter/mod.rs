//! Converter module for transcoding audio files.
//!
//! This module provides the `Converter` trait, the capability every runner
//! uses to turn one input file into one output file, and an FFmpeg-backed
//! implementation of it.
//!
//! # Example
//!
//! ```ignore
//! use audioconv_core::converter::{Converter, FfmpegConverter, TargetFormat};
//!
//! let converter = FfmpegConverter::with_defaults();
//!
//! // Validate ffmpeg is available
//! converter.validate().await?;
//!
//! let output = converter
//!     .convert(Path::new("song.flac"), Path::new("out/song.mp3"), TargetFormat::Mp3)
//!     .await?;
//! println!("Wrote {} bytes", output.output_size_bytes);
//! ```

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::ConverterConfig;
pub use error::ConverterError;
pub use ffmpeg::FfmpegConverter;
pub use traits::Converter;
pub use types::{ConversionOutput, TargetFormat};
