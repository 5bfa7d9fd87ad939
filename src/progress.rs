//! Progress-callback trait for per-worker conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline launches and finishes rasterizer workers.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a channel, a log, or a terminal progress bar without the
//! library knowing anything about how the host application communicates. The
//! trait is `Send + Sync` because workers complete concurrently.
//!
//! Granularity is the worker, not the page: the external rasterizer gives no
//! per-page feedback while it runs, so a page-level callback would have to
//! lie about timing.

use crate::pipeline::partition::PageRange;
use std::sync::Arc;

/// Called by the conversion pipeline as workers run.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `on_worker_start` and `on_worker_complete` may be
/// called concurrently from different tasks; implementations must protect
/// shared mutable state themselves.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after partitioning, before any worker is launched.
    ///
    /// # Arguments
    /// * `total_pages` — pages in the selected window
    /// * `workers`     — number of ranges (= effective concurrency)
    fn on_conversion_start(&self, total_pages: u32, workers: usize) {
        let _ = (total_pages, workers);
    }

    /// Called just before a worker's rasterizer process is spawned.
    fn on_worker_start(&self, range: PageRange) {
        let _ = range;
    }

    /// Called when a worker's process has exited and its output is captured.
    fn on_worker_complete(&self, range: PageRange) {
        let _ = range;
    }

    /// Called once after aggregation, with the final image count.
    fn on_conversion_complete(&self, image_count: usize) {
        let _ = image_count;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        started: AtomicUsize,
        completed: AtomicUsize,
        images: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_worker_start(&self, _range: PageRange) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }

        fn on_worker_complete(&self, _range: PageRange) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }

        fn on_conversion_complete(&self, image_count: usize) {
            self.images.store(image_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start(13, 4);
        cb.on_worker_start(PageRange { first: 1, last: 4 });
        cb.on_worker_complete(PageRange { first: 1, last: 4 });
        cb.on_conversion_complete(13);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            started: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            images: AtomicUsize::new(0),
        };

        tracker.on_worker_start(PageRange { first: 1, last: 2 });
        tracker.on_worker_complete(PageRange { first: 1, last: 2 });
        tracker.on_worker_start(PageRange { first: 3, last: 4 });
        tracker.on_worker_complete(PageRange { first: 3, last: 4 });
        tracker.on_conversion_complete(4);

        assert_eq!(tracker.started.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completed.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.images.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_conversion_start(5, 2);
        cb.on_worker_complete(PageRange { first: 1, last: 5 });
    }
}
