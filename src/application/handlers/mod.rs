//! Application handlers.
//!
//! Command handlers that orchestrate domain operations.

mod reconciliation;
mod transfer;

#[cfg(test)]
pub(crate) mod test_support;

pub use reconciliation::{
    AutoMatchCommand, AutoMatchHandler, AutoMatchResult, ReassignMappingCommand,
    ReassignMappingHandler, ReassignMappingResult, RejectedPosition, SetMappingStatusCommand,
    SetMappingStatusHandler, SetMappingStatusResult,
};
pub use transfer::{ApplyTransferCommand, ApplyTransferHandler, TransferSettings};

use crate::domain::foundation::SerializableDomainEvent;
use crate::ports::EventPublisher;

/// Publishes an event after its change was persisted.
///
/// The change is already committed, so a failure here is logged and
/// swallowed rather than reported to the caller.
pub(crate) async fn publish_committed<E: SerializableDomainEvent>(
    publisher: &dyn EventPublisher,
    event: &E,
) {
    let envelope = match event.to_envelope() {
        Ok(envelope) => envelope,
        Err(err) => {
            tracing::error!(event_type = event.event_type(), error = %err, "failed to serialize event");
            return;
        }
    };
    if let Err(err) = publisher.publish(envelope).await {
        tracing::error!(
            event_type = event.event_type(),
            aggregate_id = %event.aggregate_id(),
            error = %err,
            "failed to publish event"
        );
    }
}
