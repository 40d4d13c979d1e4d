//! Transfer bookkeeping: live progress counters and the final report.

mod events;

pub use events::TransferCompleted;

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::domain::foundation::{MappingId, PositionId};

/// Progress of a running transfer, shared with callers.
///
/// Counters are updated atomically by the workers; `cancel` stops new
/// per-mapping work from being started.
#[derive(Debug, Default)]
pub struct TransferProgress {
    total: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
    cancelled: AtomicBool,
}

impl TransferProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that no further mappings be started.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub(crate) fn begin(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
        self.completed.store(0, Ordering::SeqCst);
        self.failed.store(0, Ordering::SeqCst);
    }

    pub(crate) fn record_success(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total: self.total.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            cancelled: self.is_cancelled(),
        }
    }
}

/// Point-in-time copy of [`TransferProgress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Mappings scheduled for copying.
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: bool,
}

impl ProgressSnapshot {
    /// Mappings neither completed nor failed yet.
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.completed + self.failed)
    }
}

/// A mapping whose children could not be copied.
///
/// The mapping keeps its status and can be retried by a later run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferFailure {
    pub mapping_id: MappingId,
    pub old_position_id: Option<PositionId>,
    pub new_position_id: Option<PositionId>,
    pub message: String,
}

/// Aggregate outcome of `apply_all`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferResult {
    /// Positions whose children were copied in this run.
    pub positions_transferred: usize,
    pub items_transferred: usize,
    pub links_transferred: usize,
    /// Links not copied because an endpoint did not survive translation.
    pub links_dropped: usize,
    /// Mappings marked applied without copying.
    pub bookkeeping_applied: usize,
    /// Mappings left untouched because the run was cancelled.
    pub mappings_skipped: usize,
    pub errors: Vec<TransferFailure>,
}

impl TransferResult {
    pub fn is_complete_success(&self) -> bool {
        self.errors.is_empty() && self.mappings_skipped == 0
    }

    /// Adds the counts of one copied mapping.
    pub fn absorb(&mut self, copied: &CopyOutcome) {
        self.positions_transferred += 1;
        self.absorb_rows(copied);
    }

    /// Adds rows written by a mapping that did not finish.
    pub fn absorb_rows(&mut self, copied: &CopyOutcome) {
        self.items_transferred += copied.items;
        self.links_transferred += copied.links;
        self.links_dropped += copied.links_dropped;
    }
}

/// Rows written while copying one mapping's children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyOutcome {
    pub items: usize,
    pub links: usize,
    pub links_dropped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_counts_and_cancels() {
        let progress = TransferProgress::new();
        progress.begin(3);
        progress.record_success();
        progress.record_failure();

        let snap = progress.snapshot();
        assert_eq!(snap.total, 3);
        assert_eq!(snap.completed, 1);
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.remaining(), 1);
        assert!(!snap.cancelled);

        progress.cancel();
        assert!(progress.is_cancelled());
        assert!(progress.snapshot().cancelled);
    }

    #[test]
    fn begin_resets_counters() {
        let progress = TransferProgress::new();
        progress.begin(2);
        progress.record_success();
        progress.begin(5);
        assert_eq!(progress.snapshot().completed, 0);
        assert_eq!(progress.snapshot().total, 5);
    }

    #[test]
    fn result_absorbs_copy_counts() {
        let mut result = TransferResult::default();
        result.absorb(&CopyOutcome {
            items: 3,
            links: 1,
            links_dropped: 1,
        });
        result.absorb(&CopyOutcome::default());
        assert_eq!(result.positions_transferred, 2);
        assert_eq!(result.items_transferred, 3);
        assert_eq!(result.links_transferred, 1);
        assert_eq!(result.links_dropped, 1);
        assert!(result.is_complete_success());
    }

    #[test]
    fn partial_rows_count_without_a_position() {
        let mut result = TransferResult::default();
        result.absorb_rows(&CopyOutcome {
            items: 2,
            links: 0,
            links_dropped: 0,
        });
        assert_eq!(result.positions_transferred, 0);
        assert_eq!(result.items_transferred, 2);
    }
}
