//! Adapters - Implementations of port interfaces.
//!
//! - `memory` - In-memory repositories, fault injection and JSON fixtures
//! - `events` - Event bus implementations

pub mod events;
pub mod memory;

pub use events::InMemoryEventBus;
pub use memory::{
    FaultInjector, InMemoryBoqItemRepository, InMemoryLinkRepository, InMemoryMappingRepository,
    InMemoryPositionRepository, InMemoryStore, TenderFixture,
};
