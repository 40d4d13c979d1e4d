//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, error types and event plumbing
//! that form the vocabulary of the reconciliation domain.

mod errors;
mod events;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{
    domain_event, DomainEvent, EventEnvelope, EventId, SerializableDomainEvent,
};
pub use ids::{BoqItemId, LinkId, MappingId, PositionId, TenderId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
