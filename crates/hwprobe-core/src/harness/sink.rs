//! Observability hooks for a run.

use std::path::Path;

/// Receives coarse progress from the collector.
///
/// Called outside the timed window of every invocation. Implementations must
/// not fail; a sink that cannot write should drop the signal.
pub trait ProgressSink {
    /// The subject executable was missing and a build is about to run in `dir`.
    fn build_started(&mut self, _dir: &Path) {}

    /// Trial `index` (zero-based) of `total` is about to start.
    fn iteration(&mut self, index: u64, total: u64);

    /// All `total` trials completed.
    fn finished(&mut self, _total: u64) {}
}

/// A sink that discards every signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn iteration(&mut self, _index: u64, _total: u64) {}
}

impl<S: ProgressSink + ?Sized> ProgressSink for &mut S {
    fn build_started(&mut self, dir: &Path) {
        (**self).build_started(dir);
    }

    fn iteration(&mut self, index: u64, total: u64) {
        (**self).iteration(index, total);
    }

    fn finished(&mut self, total: u64) {
        (**self).finished(total);
    }
}
