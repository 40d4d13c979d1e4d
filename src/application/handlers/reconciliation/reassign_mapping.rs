//! ReassignMappingHandler - Command handler for rebinding a mapping by hand.
//!
//! The whole change (freeing or removing the current holder of the target,
//! rebinding the mapping, representing an orphaned position) is planned
//! against the full mapping set and committed in one atomic write.

use std::sync::Arc;

use super::super::publish_committed;
use crate::domain::foundation::{
    DomainError, EventId, MappingId, PositionId, Timestamp, ValidationError,
};
use crate::domain::reconciliation::{Mapping, MappingChangeSet, MappingReassigned, MappingSet};
use crate::domain::tender::PositionSnapshot;
use crate::ports::{EventPublisher, MappingRepository, PositionRepository};

/// Command to bind a mapping to another new position, or to none.
#[derive(Debug, Clone)]
pub struct ReassignMappingCommand {
    pub mapping_id: MappingId,
    pub new_position_id: Option<PositionId>,
}

#[derive(Debug, Clone)]
pub struct ReassignMappingResult {
    /// The reassigned mapping as stored.
    pub mapping: Mapping,
    /// Everything written in the commit, including `mapping`.
    pub changes: MappingChangeSet,
    pub event: MappingReassigned,
}

pub struct ReassignMappingHandler {
    positions: Arc<dyn PositionRepository>,
    mappings: Arc<dyn MappingRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl ReassignMappingHandler {
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

    /// # Errors
    ///
    /// - `NotFound` if the mapping or the target position is missing
    /// - `Validation` if the target belongs to another tender or is additional
    /// - `InvalidState` if the mapping cannot be reassigned
    /// - `Conflict` if the commit would break new-position uniqueness
    #[tracing::instrument(
        skip(self, cmd),
        fields(mapping = %cmd.mapping_id, target = ?cmd.new_position_id)
    )]
    pub async fn handle(
        &self,
        cmd: ReassignMappingCommand,
    ) -> Result<ReassignMappingResult, DomainError> {
        // 1. Load mapping
        let mapping = self
            .mappings
            .find_by_id(&cmd.mapping_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Mapping", cmd.mapping_id))?;
        let new_tender = mapping.tenders().new;

        // 2. Resolve target
        let target = match cmd.new_position_id {
            Some(id) => Some(self.resolve_target(id, &mapping).await?),
            None => None,
        };

        // 3. Plan against the full set
        let mut set = MappingSet::new(self.mappings.list_by_new_tender(&new_tender).await?);
        let changes = set.plan_reassign(cmd.mapping_id, target)?;

        set.apply(&changes);
        set.verify_exclusivity()?;

        // 4. Commit atomically
        self.mappings.apply_changes(&changes).await?;

        let updated = changes
            .upserted(cmd.mapping_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("Mapping", cmd.mapping_id))?;

        tracing::info!(
            upserts = changes.upserts.len(),
            deletions = changes.deletions.len(),
            "mapping reassigned"
        );

        // 5. Publish event
        let event = MappingReassigned {
            event_id: EventId::new(),
            mapping_id: cmd.mapping_id,
            previous_position_id: mapping.new_position_id(),
            new_position_id: updated.new_position_id(),
            updated_mapping_ids: changes
                .upserts
                .iter()
                .map(Mapping::id)
                .filter(|id| *id != cmd.mapping_id)
                .collect(),
            removed_mapping_ids: changes.deletions.clone(),
            reassigned_at: Timestamp::now(),
        };
        publish_committed(self.event_publisher.as_ref(), &event).await;

        Ok(ReassignMappingResult {
            mapping: updated,
            changes,
            event,
        })
    }

    async fn resolve_target(
        &self,
        position_id: PositionId,
        mapping: &Mapping,
    ) -> Result<PositionSnapshot, DomainError> {
        let position = self
            .positions
            .get(&position_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Position", position_id))?;

        if position.tender_id != mapping.tenders().new {
            return Err(ValidationError::invalid_format(
                "new_position_id",
                format!(
                    "position {} belongs to tender {}, not {}",
                    position_id,
                    position.tender_id,
                    mapping.tenders().new
                ),
            )
            .into());
        }
        if position.is_additional {
            return Err(ValidationError::invalid_format(
                "new_position_id",
                "additional positions are carried forward and cannot be matched",
            )
            .into());
        }
        Ok(position.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::Harness;
    use crate::application::{AutoMatchCommand, AutoMatchHandler};
    use crate::domain::foundation::TenderId;
    use crate::domain::reconciliation::{MappingStatus, MappingType, MatchingOptions};
    use crate::domain::tender::{Position, PositionDraft};

    struct Scenario {
        h: Harness,
        old: Vec<Position>,
        new: Vec<Position>,
    }

    impl Scenario {
        async fn mapping_of_old(&self, index: usize) -> Mapping {
            self.set()
                .await
                .iter()
                .find(|m| m.old_position_id() == Some(self.old[index].id))
                .cloned()
                .unwrap()
        }

        async fn set(&self) -> MappingSet {
            MappingSet::new(
                self.h
                    .store
                    .mappings
                    .list_by_new_tender(&self.h.new_tender)
                    .await
                    .unwrap(),
            )
        }

        async fn assert_invariants(&self) {
            let set = self.set().await;
            set.verify_exclusivity().unwrap();
            set.verify_completeness(&self.old, &self.new).unwrap();
        }
    }

    async fn scenario() -> Scenario {
        let h = Harness::new();
        let old = vec![
            h.add_old(PositionDraft::new("1", "Фундамент")).await,
            h.add_old(PositionDraft::new("2", "Стены")).await,
            h.add_old(PositionDraft::new("3", "Перекрытия")).await,
        ];
        let new = vec![
            h.add_new(PositionDraft::new("1", "Фундамент")).await,
            h.add_new(PositionDraft::new("2", "Стены")).await,
            h.add_new(PositionDraft::new("7", "Кровля")).await,
        ];
        AutoMatchHandler::new(
            Arc::new(h.store.positions.clone()),
            Arc::new(h.store.mappings.clone()),
            h.bus.clone(),
        )
        .handle(AutoMatchCommand {
            old_tender_id: h.old_tender,
            new_tender_id: h.new_tender,
            options: MatchingOptions::default(),
        })
        .await
        .unwrap();
        Scenario { h, old, new }
    }

    fn handler(h: &Harness) -> ReassignMappingHandler {
        ReassignMappingHandler::new(
            Arc::new(h.store.positions.clone()),
            Arc::new(h.store.mappings.clone()),
            h.bus.clone(),
        )
    }

    fn reassign(mapping: &Mapping, target: Option<&Position>) -> ReassignMappingCommand {
        ReassignMappingCommand {
            mapping_id: mapping.id(),
            new_position_id: target.map(|p| p.id),
        }
    }

    #[tokio::test]
    async fn stealing_a_position_frees_its_holder() {
        let s = scenario().await;
        let a = s.mapping_of_old(0).await;
        let b = s.mapping_of_old(2).await;
        assert_eq!(b.mapping_type(), MappingType::Deleted);

        let result = handler(&s.h)
            .handle(reassign(&b, Some(&s.new[0])))
            .await
            .unwrap();

        assert_eq!(result.mapping.new_position_id(), Some(s.new[0].id));
        assert_eq!(result.mapping.mapping_type(), MappingType::Manual);
        assert_eq!(result.mapping.status(), MappingStatus::Confirmed);
        assert_eq!(result.event.updated_mapping_ids, vec![a.id()]);

        let a = s.h.store.mappings.find_by_id(&a.id()).await.unwrap().unwrap();
        assert!(a.new_position().is_none());
        assert_eq!(a.mapping_type(), MappingType::Deleted);
        assert_eq!(a.status(), MappingStatus::Suggested);
        assert_eq!(a.confidence(), 0.0);

        s.assert_invariants().await;
    }

    #[tokio::test]
    async fn claiming_an_orphan_removes_its_new_mapping() {
        let s = scenario().await;
        let orphan = s.set().await.holder_of(s.new[2].id).unwrap().id();
        let m = s.mapping_of_old(2).await;

        let result = handler(&s.h)
            .handle(reassign(&m, Some(&s.new[2])))
            .await
            .unwrap();

        assert_eq!(result.event.removed_mapping_ids, vec![orphan]);
        assert!(s.h.store.mappings.find_by_id(&orphan).await.unwrap().is_none());
        s.assert_invariants().await;
    }

    #[tokio::test]
    async fn unbinding_represents_the_orphaned_position() {
        let s = scenario().await;
        let m = s.mapping_of_old(1).await;

        handler(&s.h).handle(reassign(&m, None)).await.unwrap();

        let holder = s.set().await.holder_of(s.new[1].id).cloned().unwrap();
        assert_eq!(holder.mapping_type(), MappingType::New);
        assert!(holder.is_persisted());
        s.assert_invariants().await;
    }

    #[tokio::test]
    async fn any_sequence_of_reassignments_keeps_invariants() {
        let s = scenario().await;
        let handler = handler(&s.h);
        let moves = [(0, Some(1)), (1, Some(2)), (2, Some(0)), (0, None), (1, Some(1)), (0, Some(2))];

        for (old_index, target) in moves {
            let m = s.mapping_of_old(old_index).await;
            handler
                .handle(reassign(&m, target.map(|i| &s.new[i])))
                .await
                .unwrap();
            s.assert_invariants().await;
        }
    }

    #[tokio::test]
    async fn target_from_another_tender_is_rejected() {
        let s = scenario().await;
        let m = s.mapping_of_old(2).await;

        let err = handler(&s.h)
            .handle(reassign(&m, Some(&s.old[0])))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        s.assert_invariants().await;
    }

    #[tokio::test]
    async fn additional_target_is_rejected() {
        let s = scenario().await;
        let extra = s
            .h
            .store
            .positions
            .create(&s.h.new_tender, PositionDraft::new("", "ДОП работы").additional())
            .await
            .unwrap();
        let m = s.mapping_of_old(2).await;

        let err = handler(&s.h)
            .handle(reassign(&m, Some(&extra)))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn missing_target_is_not_found() {
        let s = scenario().await;
        let m = s.mapping_of_old(2).await;
        let ghost = Position::from_draft(PositionId::new(), TenderId::new(), PositionDraft::new("1", "x"));

        let err = handler(&s.h)
            .handle(reassign(&m, Some(&ghost)))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Position", .. }));
    }

    #[tokio::test]
    async fn publishes_reassigned_event() {
        let s = scenario().await;
        let m = s.mapping_of_old(2).await;
        handler(&s.h)
            .handle(reassign(&m, Some(&s.new[2])))
            .await
            .unwrap();

        let events = s.h.bus.events_of_type("mapping.reassigned.v1");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].aggregate_id, m.id().to_string());
    }
}
