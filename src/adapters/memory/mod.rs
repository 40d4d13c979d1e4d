//! In-memory storage adapters.
//!
//! Back the repository ports with `tokio::sync::RwLock`-guarded maps.
//! Used by the CLI and by tests; nothing survives a restart.

mod boq_items;
mod faults;
mod fixture;
mod links;
mod mappings;
mod positions;

pub use boq_items::InMemoryBoqItemRepository;
pub use faults::FaultInjector;
pub use fixture::{FixtureError, SeededTenders, TenderFixture};
pub use links::InMemoryLinkRepository;
pub use mappings::InMemoryMappingRepository;
pub use positions::InMemoryPositionRepository;

/// One set of repositories sharing a single fault plan.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    pub positions: InMemoryPositionRepository,
    pub items: InMemoryBoqItemRepository,
    pub links: InMemoryLinkRepository,
    pub mappings: InMemoryMappingRepository,
    pub faults: FaultInjector,
}

impl InMemoryStore {
    pub fn new() -> Self {
        let faults = FaultInjector::new();
        Self {
            positions: InMemoryPositionRepository::new(),
            items: InMemoryBoqItemRepository::with_faults(faults.clone()),
            links: InMemoryLinkRepository::with_faults(faults.clone()),
            mappings: InMemoryMappingRepository::new(),
            faults,
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
