//! Transfer domain events.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{domain_event, EventId, TenderId, Timestamp};

/// Published when an `apply_all` run finishes, successful or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferCompleted {
    pub event_id: EventId,
    pub new_tender_id: TenderId,
    pub old_tender_id: TenderId,
    pub positions_transferred: usize,
    pub items_transferred: usize,
    pub links_transferred: usize,
    pub failures: usize,
    pub completed_at: Timestamp,
}

domain_event!(
    TransferCompleted,
    event_type = "transfer.completed.v1",
    aggregate_id = new_tender_id,
    aggregate_type = "Tender",
    occurred_at = completed_at,
    event_id = event_id
);
