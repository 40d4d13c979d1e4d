//! SetMappingStatusHandler - Command handler for confirming or rejecting a mapping.

use std::sync::Arc;

use super::super::publish_committed;
use crate::domain::foundation::{DomainError, EventId, MappingId, Timestamp, ValidationError};
use crate::domain::reconciliation::{Mapping, MappingStatus, MappingStatusChanged};
use crate::ports::{EventPublisher, MappingRepository};

/// Command to record a reviewer's decision on a mapping.
#[derive(Debug, Clone)]
pub struct SetMappingStatusCommand {
    pub mapping_id: MappingId,
    /// `Confirmed` or `Rejected`.
    pub status: MappingStatus,
}

impl SetMappingStatusCommand {
    pub fn confirm(mapping_id: MappingId) -> Self {
        Self {
            mapping_id,
            status: MappingStatus::Confirmed,
        }
    }

    pub fn reject(mapping_id: MappingId) -> Self {
        Self {
            mapping_id,
            status: MappingStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SetMappingStatusResult {
    pub mapping: Mapping,
    /// `None` when the mapping already had the requested status.
    pub event: Option<MappingStatusChanged>,
}

pub struct SetMappingStatusHandler {
    repository: Arc<dyn MappingRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl SetMappingStatusHandler {
    pub fn new(
        repository: Arc<dyn MappingRepository>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            repository,
            event_publisher,
        }
    }

    #[tracing::instrument(skip(self, cmd), fields(mapping = %cmd.mapping_id, status = %cmd.status))]
    pub async fn handle(
        &self,
        cmd: SetMappingStatusCommand,
    ) -> Result<SetMappingStatusResult, DomainError> {
        // 1. Only review decisions may be set by hand
        if !matches!(cmd.status, MappingStatus::Confirmed | MappingStatus::Rejected) {
            return Err(ValidationError::invalid_format(
                "status",
                format!("{} cannot be set manually", cmd.status),
            )
            .into());
        }

        // 2. Load mapping
        let mut mapping = self
            .repository
            .find_by_id(&cmd.mapping_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Mapping", cmd.mapping_id))?;

        // 3. Apply transition
        let from = mapping.status();
        if !mapping.set_status(cmd.status)? {
            return Ok(SetMappingStatusResult {
                mapping,
                event: None,
            });
        }

        // 4. Persist
        self.repository.update(&mapping).await?;

        // 5. Publish event
        let event = MappingStatusChanged {
            event_id: EventId::new(),
            mapping_id: cmd.mapping_id,
            from,
            to: cmd.status,
            changed_at: Timestamp::now(),
        };
        publish_committed(self.event_publisher.as_ref(), &event).await;

        Ok(SetMappingStatusResult {
            mapping,
            event: Some(event),
        })
    }
}
