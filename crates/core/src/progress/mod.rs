//! Aggregate progress of a conversion run.
//!
//! The [`ProgressReporter`] is an owned, single-writer state object. The
//! runners feed it from their single result consumer; presentation layers
//! hold a [`ProgressWatcher`] and read immutable [`ProgressSnapshot`]s at any
//! cadence without blocking the run.

mod reporter;
mod types;

pub use reporter::{ProgressReporter, ProgressWatcher};
pub use types::{ProgressSnapshot, RunState};
