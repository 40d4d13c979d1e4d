//! Write-failure injection for the in-memory repositories.
//!
//! Lets tests and demos exercise the retry and continue-on-error paths of
//! the transfer without a real storage engine.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, PositionId};

/// Shared failure plan consulted before every child-row write.
///
/// Cloning shares the plan, so one injector can be handed to the item and
/// link repositories alike.
#[derive(Debug, Clone, Default)]
pub struct FaultInjector {
    transient_remaining: Arc<AtomicUsize>,
    broken_positions: Arc<RwLock<HashSet<PositionId>>>,
    crash_after: Arc<RwLock<Option<usize>>>,
}

impl FaultInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `count` writes fail with a transient error.
    pub fn fail_next(&self, count: usize) {
        self.transient_remaining.store(count, Ordering::SeqCst);
    }

    /// Every write targeting `position_id` fails permanently.
    pub async fn break_position(&self, position_id: PositionId) {
        self.broken_positions.write().await.insert(position_id);
    }

    pub async fn repair_position(&self, position_id: &PositionId) {
        self.broken_positions.write().await.remove(position_id);
    }

    /// Lets `successes` more writes through, then fails the next one
    /// permanently. Fires once.
    pub async fn crash_after(&self, successes: usize) {
        *self.crash_after.write().await = Some(successes);
    }

    /// Transient failures still queued.
    pub fn pending_transient(&self) -> usize {
        self.transient_remaining.load(Ordering::SeqCst)
    }

    pub(crate) async fn before_write(&self, target: PositionId) -> Result<(), DomainError> {
        if self.broken_positions.read().await.contains(&target) {
            return Err(DomainError::storage(format!(
                "writes to position {} are rejected",
                target
            )));
        }

        let consumed = self
            .transient_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if consumed {
            return Err(DomainError::transient(format!(
                "simulated timeout writing to position {}",
                target
            )));
        }

        let mut crash = self.crash_after.write().await;
        match crash.as_mut() {
            Some(0) => {
                *crash = None;
                Err(DomainError::storage(format!(
                    "simulated crash writing to position {}",
                    target
                )))
            }
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}
