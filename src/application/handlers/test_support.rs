//! Shared wiring for handler tests.

use std::sync::Arc;

use crate::adapters::{InMemoryEventBus, InMemoryStore};
use crate::domain::foundation::TenderId;
use crate::domain::tender::{Position, PositionDraft};
use crate::ports::PositionRepository;

pub(crate) struct Harness {
    pub store: InMemoryStore,
    pub bus: Arc<InMemoryEventBus>,
    pub old_tender: TenderId,
    pub new_tender: TenderId,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            store: InMemoryStore::new(),
            bus: Arc::new(InMemoryEventBus::new()),
            old_tender: TenderId::new(),
            new_tender: TenderId::new(),
        }
    }

    pub async fn add_old(&self, draft: PositionDraft) -> Position {
        self.store
            .positions
            .create(&self.old_tender, draft)
            .await
            .unwrap()
    }

    pub async fn add_new(&self, draft: PositionDraft) -> Position {
        self.store
            .positions
            .create(&self.new_tender, draft)
            .await
            .unwrap()
    }
}
