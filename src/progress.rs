//! Progress reporting.
//!
//! A run reports progress through a [`ProgressCallback`] attached to
//! [`FlipbookOptions`](crate::FlipbookOptions). Callbacks receive a
//! [`ProgressInfo`] snapshot every
//! [`batch_size`](crate::FlipbookOptions::with_batch_size) frames, and once
//! more when a stage ends between two batches.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use flipbook::{
//!     Flipbook, FlipbookError, FlipbookOptions, OperationType, ProgressCallback, ProgressInfo,
//! };
//!
//! struct PageCounter;
//!
//! impl ProgressCallback for PageCounter {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if info.operation == OperationType::Pagination {
//!             if let Some(page) = info.current_page {
//!                 eprintln!("frame {} on page {}", info.current, page + 1);
//!             }
//!         }
//!     }
//! }
//!
//! let options = FlipbookOptions::new()
//!     .with_progress(Arc::new(PageCounter))
//!     .with_batch_size(25);
//! Flipbook::open("input.mp4")?.create("flip-book.pdf", &options)?;
//! # Ok::<(), FlipbookError>(())
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

/// The stage of a run currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Re-encoding a video at the requested frame rate.
    Resampling,
    /// Placing frames on pages.
    Pagination,
}

/// A snapshot of run progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Stage the snapshot belongs to.
    pub operation: OperationType,
    /// Frames processed so far in this stage.
    pub current: u64,
    /// Frames the stage expects to process, if known.
    pub total: Option<u64>,
    /// `current / total` as a percentage.
    ///
    /// Frame counts of video sources are estimates, so this may briefly
    /// exceed 100.
    pub percentage: Option<f32>,
    /// Time since the stage started.
    pub elapsed: Duration,
    /// Remaining time extrapolated from the average rate so far.
    pub estimated_remaining: Option<Duration>,
    /// Sequence index of the frame just processed.
    pub current_frame: Option<u64>,
    /// Page the frame was placed on (pagination only).
    pub current_page: Option<u64>,
}

/// Receives progress snapshots.
///
/// Callbacks observe a run; they cannot stop it.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, info: &ProgressInfo);
}

/// The default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Counts processed frames for one stage and forwards batched snapshots.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    expected: Option<u64>,
    processed: u64,
    unreported: u64,
    batch_size: u64,
    started: Instant,
}

impl ProgressTracker {
    /// `expected` of zero is treated as unknown.
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        expected: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            expected: expected.filter(|&frames| frames > 0),
            processed: 0,
            unreported: 0,
            batch_size: batch_size.max(1),
            started: Instant::now(),
        }
    }

    /// Count one frame; report when a full batch is pending.
    pub(crate) fn advance(&mut self, frame: Option<u64>, page: Option<u64>) {
        self.processed += 1;
        self.unreported += 1;
        if self.unreported == self.batch_size {
            self.emit(frame, page);
        }
    }

    /// Report whatever is still pending. A stage that processed nothing
    /// still reports once.
    pub(crate) fn finish(&mut self) {
        if self.unreported > 0 || self.processed == 0 {
            self.emit(None, None);
        }
    }

    fn emit(&mut self, frame: Option<u64>, page: Option<u64>) {
        self.unreported = 0;
        let elapsed = self.started.elapsed();
        let info = ProgressInfo {
            operation: self.operation,
            current: self.processed,
            total: self.expected,
            percentage: self
                .expected
                .map(|expected| self.processed as f32 * 100.0 / expected as f32),
            elapsed,
            estimated_remaining: self.remaining(elapsed),
            current_frame: frame,
            current_page: page,
        };
        self.callback.on_progress(&info);
    }

    fn remaining(&self, elapsed: Duration) -> Option<Duration> {
        let expected = self.expected?;
        if self.processed == 0 {
            return None;
        }
        let left = expected.saturating_sub(self.processed);
        Some(elapsed.mul_f64(left as f64 / self.processed as f64))
    }
}
