//! Progress reporting for dataset loading.
//!
//! Loading walks a list of sample and region files; [`ProgressCallback`]
//! receives one unit per file so a frontend can render a bar while the
//! loader stays independent of any terminal library.

use std::sync::Arc;

/// Receives file-level progress from the loader.
pub trait ProgressCallback: Send + Sync {
    /// Total number of files about to be read.
    fn set_total(&self, total: u64);

    /// Advance by `delta` files.
    fn inc(&self, delta: u64);

    /// Name of the file currently being read.
    fn set_message(&self, msg: String);

    /// Loading finished; `msg` summarizes the result.
    fn finish(&self, msg: String);
}

/// Ignores all progress updates. Used by tests and non-interactive runs.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`] instance.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
