//! AutoMatchHandler - Command handler for generating a tender's mapping set.

use serde::Serialize;
use std::sync::Arc;

use super::super::publish_committed;
use crate::domain::foundation::{
    DomainError, EventId, PositionId, TenderId, Timestamp, ValidationError,
};
use crate::domain::reconciliation::{
    auto_match, Mapping, MappingStatus, MappingsGenerated, MatchingOptions, TenderPair,
};
use crate::domain::tender::Position;
use crate::ports::{EventPublisher, MappingRepository, PositionRepository};

/// Command to match a new tender version against its predecessor.
#[derive(Debug, Clone)]
pub struct AutoMatchCommand {
    pub old_tender_id: TenderId,
    pub new_tender_id: TenderId,
    pub options: MatchingOptions,
}

/// A position left out of matching because it failed validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedPosition {
    pub position_id: PositionId,
    pub tender_id: TenderId,
    pub number: Option<String>,
    pub reason: String,
}

/// Result of a successful matching pass.
#[derive(Debug, Clone)]
pub struct AutoMatchResult {
    /// The stored mapping set, in emission order.
    pub mappings: Vec<Mapping>,
    pub rejected: Vec<RejectedPosition>,
    pub event: MappingsGenerated,
}

/// Handler for auto-matching.
pub struct AutoMatchHandler {
    positions: Arc<dyn PositionRepository>,
    mappings: Arc<dyn MappingRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl AutoMatchHandler {
    pub fn new(
        positions: Arc<dyn PositionRepository>,
        mappings: Arc<dyn MappingRepository>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            positions,
            mappings,
            event_publisher,
        }
    }

    /// Runs the matching pass and replaces the new tender's mapping set.
    ///
    /// # Errors
    ///
    /// - `Validation` if the options are inconsistent or both ids are equal
    /// - `InvalidState` if the current mapping set has applied mappings
    /// - any storage error from the repositories
    #[tracing::instrument(
        skip(self, cmd),
        fields(old_tender = %cmd.old_tender_id, new_tender = %cmd.new_tender_id)
    )]
    pub async fn handle(&self, cmd: AutoMatchCommand) -> Result<AutoMatchResult, DomainError> {
        // 1. Validate the request
        cmd.options.validate()?;
        if cmd.old_tender_id == cmd.new_tender_id {
            return Err(ValidationError::invalid_format(
                "new_tender_id",
                "must differ from old_tender_id",
            )
            .into());
        }

        // 2. Refuse to discard mappings whose data was already transferred
        let existing = self.mappings.list_by_new_tender(&cmd.new_tender_id).await?;
        let applied = existing
            .iter()
            .filter(|m| m.status() == MappingStatus::Applied)
            .count();
        if applied > 0 {
            return Err(DomainError::invalid_state(format!(
                "tender {} already has {} applied mappings",
                cmd.new_tender_id, applied
            )));
        }

        // 3. Load both versions, dropping malformed positions
        let mut rejected = Vec::new();
        let old = screen(self.positions.list(&cmd.old_tender_id).await?, &mut rejected);
        let new = screen(self.positions.list(&cmd.new_tender_id).await?, &mut rejected);

        // 4. Match off the async executor
        let options = cmd.options;
        let outcome = tokio::task::spawn_blocking(move || auto_match(&old, &new, &options))
            .await
            .map_err(|e| DomainError::storage(format!("matching task aborted: {}", e)))?;

        let event = MappingsGenerated {
            event_id: EventId::new(),
            new_tender_id: cmd.new_tender_id,
            old_tender_id: cmd.old_tender_id,
            exact: outcome.exact_count(),
            fuzzy: outcome.matched_count() - outcome.exact_count(),
            deleted: outcome.deleted_count(),
            created: outcome.created_count(),
            additional: outcome.additional_count(),
            rejected_positions: rejected.len(),
            generated_at: Timestamp::now(),
        };

        // 5. Persist
        let pair = TenderPair::new(cmd.old_tender_id, cmd.new_tender_id);
        let mappings = self
            .mappings
            .replace_for_tender(&cmd.new_tender_id, outcome.into_mappings(pair))
            .await?;

        tracing::info!(
            exact = event.exact,
            fuzzy = event.fuzzy,
            deleted = event.deleted,
            created = event.created,
            additional = event.additional,
            rejected = event.rejected_positions,
            "auto-matching complete"
        );

        // 6. Publish event
        publish_committed(self.event_publisher.as_ref(), &event).await;

        Ok(AutoMatchResult {
            mappings,
            rejected,
            event,
        })
    }
}

fn screen(positions: Vec<Position>, rejected: &mut Vec<RejectedPosition>) -> Vec<Position> {
    positions
        .into_iter()
        .filter(|p| match p.validate() {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(position = %p.id, tender = %p.tender_id, error = %err, "position rejected before matching");
                rejected.push(RejectedPosition {
                    position_id: p.id,
                    tender_id: p.tender_id,
                    number: p.number.clone(),
                    reason: err.to_string(),
                });
                false
            }
        })
        .collect()
}
