//! ApplyTransferHandler - Copies BOQ data along a tender's confirmed mappings.
//!
//! Mappings are independent of each other and run on a bounded pool of
//! concurrent tasks. Inside one mapping the writes stay sequential: items
//! first, then the links between them. A failing mapping is recorded in the
//! report and left retryable; the run carries on with the rest. Copies
//! remember their source row, so a retry resumes instead of duplicating.

use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;

use super::super::publish_committed;
use crate::application::RetryPolicy;
use crate::domain::foundation::{DomainError, EventId, LinkId, PositionId, TenderId, Timestamp};
use crate::domain::reconciliation::{Mapping, MappingAction, MappingStatus};
use crate::domain::tender::IdTranslation;
use crate::domain::transfer::{
    CopyOutcome, TransferCompleted, TransferFailure, TransferProgress, TransferResult,
};
use crate::ports::{BoqItemRepository, EventPublisher, LinkRepository, MappingRepository};

/// Tuning of a transfer run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferSettings {
    /// Suggested mappings at or above this confidence are confirmed first.
    pub auto_confirm_threshold: f64,
    /// Mappings copied at the same time.
    pub concurrency: usize,
    pub retry: RetryPolicy,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            auto_confirm_threshold: 0.9,
            concurrency: 4,
            retry: RetryPolicy::default(),
        }
    }
}

/// Command to transfer all pending mappings of a new tender version.
#[derive(Debug, Clone)]
pub struct ApplyTransferCommand {
    pub new_tender_id: TenderId,
    /// Live counters; keep a clone to watch or cancel the run.
    pub progress: Arc<TransferProgress>,
}

impl ApplyTransferCommand {
    pub fn new(new_tender_id: TenderId) -> Self {
        Self {
            new_tender_id,
            progress: Arc::new(TransferProgress::new()),
        }
    }

    pub fn with_progress(mut self, progress: Arc<TransferProgress>) -> Self {
        self.progress = progress;
        self
    }
}

enum JobOutcome {
    Copied(CopyOutcome),
    /// Rows written before the failure still count.
    Failed(TransferFailure, CopyOutcome),
    Skipped,
}

pub struct ApplyTransferHandler {
    items: Arc<dyn BoqItemRepository>,
    links: Arc<dyn LinkRepository>,
    mappings: Arc<dyn MappingRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    settings: TransferSettings,
}

impl ApplyTransferHandler {
    pub fn new(
        items: Arc<dyn BoqItemRepository>,
        links: Arc<dyn LinkRepository>,
        mappings: Arc<dyn MappingRepository>,
        event_publisher: Arc<dyn EventPublisher>,
        settings: TransferSettings,
    ) -> Self {
        Self {
            items,
            links,
            mappings,
            event_publisher,
            settings,
        }
    }

    /// Runs `apply_all` for one new tender version.
    ///
    /// Per-mapping failures end up in `TransferResult::errors`; only a
    /// missing predecessor aborts the call, before anything is written.
    ///
    /// # Errors
    ///
    /// - `SystemicPrecondition` if no single predecessor tender is recorded
    /// - storage errors from loading the mapping set
    #[tracing::instrument(skip(self, cmd), fields(new_tender = %cmd.new_tender_id))]
    pub async fn handle(&self, cmd: ApplyTransferCommand) -> Result<TransferResult, DomainError> {
        let retry = &self.settings.retry;
        let progress = cmd.progress.as_ref();

        // 1. Resolve predecessor
        let mappings = retry
            .run("list_mappings", || self.mappings.list_by_new_tender(&cmd.new_tender_id))
            .await?;
        let old_tender_id = predecessor(&mappings, cmd.new_tender_id)?;

        let mut result = TransferResult::default();

        // 2. Auto-confirm confident suggestions
        let mut pending = Vec::with_capacity(mappings.len());
        for mut mapping in mappings {
            if mapping.status() == MappingStatus::Suggested
                && mapping.confidence() >= self.settings.auto_confirm_threshold
            {
                mapping.set_status(MappingStatus::Confirmed)?;
                if let Err(err) = retry.run("confirm_mapping", || self.mappings.update(&mapping)).await {
                    tracing::error!(mapping = %mapping.id(), error = %err, "auto-confirm failed");
                    result.errors.push(failure(&mapping, &err));
                    continue;
                }
                tracing::debug!(mapping = %mapping.id(), confidence = mapping.confidence(), "auto-confirmed");
            }
            pending.push(mapping);
        }

        // 3. Copy children of confirmed matches
        let (copy_jobs, bookkeeping): (Vec<Mapping>, Vec<Mapping>) = pending
            .into_iter()
            .filter(|m| !matches!(m.status(), MappingStatus::Applied | MappingStatus::Rejected))
            .filter(|m| m.action().is_bookkeeping() || m.status() == MappingStatus::Confirmed)
            .partition(|m| m.action() == MappingAction::CopyChildren);

        progress.begin(copy_jobs.len());
        let outcomes: Vec<JobOutcome> = stream::iter(copy_jobs)
            .map(|mapping| self.transfer_one(mapping, progress))
            .buffer_unordered(self.settings.concurrency.max(1))
            .collect()
            .await;

        for outcome in outcomes {
            match outcome {
                JobOutcome::Copied(copied) => result.absorb(&copied),
                JobOutcome::Failed(failed, partial) => {
                    result.absorb_rows(&partial);
                    result.errors.push(failed);
                }
                JobOutcome::Skipped => result.mappings_skipped += 1,
            }
        }

        // 4. Bookkeeping for mappings without rows to copy
        for mapping in bookkeeping {
            if progress.is_cancelled() {
                result.mappings_skipped += 1;
                continue;
            }
            match self.mark_applied(mapping).await {
                Ok(()) => result.bookkeeping_applied += 1,
                Err(failed) => result.errors.push(failed),
            }
        }

        tracing::info!(
            positions = result.positions_transferred,
            items = result.items_transferred,
            links = result.links_transferred,
            links_dropped = result.links_dropped,
            bookkeeping = result.bookkeeping_applied,
            skipped = result.mappings_skipped,
            failures = result.errors.len(),
            "transfer finished"
        );

        // 5. Publish event
        let event = TransferCompleted {
            event_id: EventId::new(),
            new_tender_id: cmd.new_tender_id,
            old_tender_id,
            positions_transferred: result.positions_transferred,
            items_transferred: result.items_transferred,
            links_transferred: result.links_transferred,
            failures: result.errors.len(),
            completed_at: Timestamp::now(),
        };
        publish_committed(self.event_publisher.as_ref(), &event).await;

        Ok(result)
    }

    #[tracing::instrument(skip_all, fields(mapping = %mapping.id()))]
    async fn transfer_one(&self, mapping: Mapping, progress: &TransferProgress) -> JobOutcome {
        if progress.is_cancelled() {
            return JobOutcome::Skipped;
        }

        let (old, new) = match (mapping.old_position_id(), mapping.new_position_id()) {
            (Some(old), Some(new)) => (old, new),
            _ => {
                progress.record_failure();
                let err = DomainError::invalid_state("copy mapping lacks a position side");
                return JobOutcome::Failed(failure(&mapping, &err), CopyOutcome::default());
            }
        };

        let mut copied = CopyOutcome::default();
        if let Err(err) = self.copy_children(old, new, &mut copied).await {
            tracing::error!(old_position = %old, new_position = %new, error = %err, "transfer failed");
            progress.record_failure();
            return JobOutcome::Failed(failure(&mapping, &err), copied);
        }

        match self.mark_applied(mapping).await {
            Ok(()) => {
                progress.record_success();
                tracing::debug!(
                    items = copied.items,
                    links = copied.links,
                    links_dropped = copied.links_dropped,
                    "mapping transferred"
                );
                JobOutcome::Copied(copied)
            }
            Err(failed) => {
                progress.record_failure();
                JobOutcome::Failed(failed, copied)
            }
        }
    }

    /// Copies what is still missing under `new`, counting rows as written.
    async fn copy_children(
        &self,
        old: PositionId,
        new: PositionId,
        outcome: &mut CopyOutcome,
    ) -> Result<(), DomainError> {
        let retry = &self.settings.retry;

        let existing = retry.run("list_copied_items", || self.items.list(&new)).await?;
        let mut translation = IdTranslation::resume(new, &existing);
        let items = retry.run("list_items", || self.items.list(&old)).await?;
        let missing: Vec<_> = items.iter().filter(|i| !translation.contains(&i.id)).collect();
        for item in missing {
            let copy = retry.run("copy_item", || self.items.copy(item, new)).await?;
            translation.record(item.id, copy.id);
            outcome.items += 1;
        }

        let done: HashSet<LinkId> = retry
            .run("list_copied_links", || self.links.list(&new))
            .await?
            .into_iter()
            .filter_map(|l| l.copied_from)
            .collect();
        let links = retry.run("list_links", || self.links.list(&old)).await?;
        for link in links.iter().filter(|l| !done.contains(&l.id)) {
            match retry.run("copy_link", || self.links.copy(link, &translation)).await? {
                Some(_) => outcome.links += 1,
                None => {
                    tracing::debug!(link = %link.id, "link dropped, endpoint was not copied");
                    outcome.links_dropped += 1;
                }
            }
        }
        Ok(())
    }

    async fn mark_applied(&self, mut mapping: Mapping) -> Result<(), TransferFailure> {
        if let Err(err) = mapping.set_status(MappingStatus::Applied) {
            return Err(failure(&mapping, &err));
        }
        self.settings
            .retry
            .run("mark_applied", || self.mappings.update(&mapping))
            .await
            .map_err(|err| {
                tracing::error!(mapping = %mapping.id(), error = %err, "could not mark mapping applied");
                failure(&mapping, &err)
            })
    }
}

fn predecessor(mappings: &[Mapping], new_tender_id: TenderId) -> Result<TenderId, DomainError> {
    let olds: HashSet<TenderId> = mappings.iter().map(|m| m.tenders().old).collect();
    let mut olds = olds.into_iter();
    match (olds.next(), olds.next()) {
        (Some(old), None) => Ok(old),
        (None, _) => Err(DomainError::precondition(format!(
            "no predecessor tender recorded for {}",
            new_tender_id
        ))),
        (Some(_), Some(_)) => Err(DomainError::precondition(format!(
            "mappings of {} point at more than one predecessor tender",
            new_tender_id
        ))),
    }
}

fn failure(mapping: &Mapping, err: &DomainError) -> TransferFailure {
    TransferFailure {
        mapping_id: mapping.id(),
        old_position_id: mapping.old_position_id(),
        new_position_id: mapping.new_position_id(),
        message: err.to_string(),
    }
}
