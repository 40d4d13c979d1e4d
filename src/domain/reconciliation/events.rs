//! Reconciliation domain events.
//!
//! - `MappingsGenerated` - Auto-matching replaced a tender's mapping set
//! - `MappingReassigned` - A mapping was rebound by hand
//! - `MappingStatusChanged` - A mapping was confirmed or rejected

use serde::{Deserialize, Serialize};

use super::MappingStatus;
use crate::domain::foundation::{domain_event, EventId, MappingId, PositionId, TenderId, Timestamp};

// ════════════════════════════════════════════════════════════════════════════
// MappingsGenerated
// ════════════════════════════════════════════════════════════════════════════

/// Published when an auto-matching pass stores a fresh mapping set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingsGenerated {
    pub event_id: EventId,

    /// New tender version the mappings belong to.
    pub new_tender_id: TenderId,

    /// Predecessor version the positions were matched against.
    pub old_tender_id: TenderId,

    pub exact: usize,
    pub fuzzy: usize,
    pub deleted: usize,
    pub created: usize,
    pub additional: usize,

    /// Positions dropped before matching because they failed validation.
    pub rejected_positions: usize,

    pub generated_at: Timestamp,
}

domain_event!(
    MappingsGenerated,
    event_type = "mappings.generated.v1",
    aggregate_id = new_tender_id,
    aggregate_type = "Tender",
    occurred_at = generated_at,
    event_id = event_id
);

// ════════════════════════════════════════════════════════════════════════════
// MappingReassigned
// ════════════════════════════════════════════════════════════════════════════

/// Published after a reassignment is committed.
///
/// Lists every mapping the change touched so read models can refresh them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingReassigned {
    pub event_id: EventId,
    pub mapping_id: MappingId,
    pub previous_position_id: Option<PositionId>,
    pub new_position_id: Option<PositionId>,

    /// Other mappings unbound or rewritten by the change.
    pub updated_mapping_ids: Vec<MappingId>,

    /// Orphan mappings removed because their position was claimed.
    pub removed_mapping_ids: Vec<MappingId>,

    pub reassigned_at: Timestamp,
}

domain_event!(
    MappingReassigned,
    event_type = "mapping.reassigned.v1",
    aggregate_id = mapping_id,
    aggregate_type = "Mapping",
    occurred_at = reassigned_at,
    event_id = event_id
);

// ════════════════════════════════════════════════════════════════════════════
// MappingStatusChanged
// ════════════════════════════════════════════════════════════════════════════

/// Published when a reviewer confirms or rejects a mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingStatusChanged {
    pub event_id: EventId,
    pub mapping_id: MappingId,
    pub from: MappingStatus,
    pub to: MappingStatus,
    pub changed_at: Timestamp,
}

domain_event!(
    MappingStatusChanged,
    event_type = "mapping.status_changed.v1",
    aggregate_id = mapping_id,
    aggregate_type = "Mapping",
    occurred_at = changed_at,
    event_id = event_id
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{DomainEvent, SerializableDomainEvent};

    #[test]
    fn status_changed_envelope_carries_mapping_id() {
        let mapping_id = MappingId::new();
        let event = MappingStatusChanged {
            event_id: EventId::new(),
            mapping_id,
            from: MappingStatus::Suggested,
            to: MappingStatus::Rejected,
            changed_at: Timestamp::now(),
        };

        let envelope = event.to_envelope().unwrap();
        assert_eq!(envelope.event_type, "mapping.status_changed.v1");
        assert_eq!(envelope.schema_version, 1);
        assert_eq!(envelope.aggregate_id, mapping_id.to_string());
        assert_eq!(envelope.payload["to"], "rejected");
    }

    #[test]
    fn generated_event_is_keyed_by_new_tender() {
        let tender = TenderId::new();
        let event = MappingsGenerated {
            event_id: EventId::new(),
            new_tender_id: tender,
            old_tender_id: TenderId::new(),
            exact: 1,
            fuzzy: 0,
            deleted: 1,
            created: 1,
            additional: 0,
            rejected_positions: 0,
            generated_at: Timestamp::now(),
        };
        assert_eq!(event.aggregate_type(), "Tender");
        assert_eq!(event.aggregate_id(), tender.to_string());
    }
}
