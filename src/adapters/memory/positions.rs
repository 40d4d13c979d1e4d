//! In-memory position repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, PositionId, TenderId};
use crate::domain::tender::{Position, PositionDraft};
use crate::ports::PositionRepository;

/// Positions grouped by tender, kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPositionRepository {
    tenders: Arc<RwLock<HashMap<TenderId, Vec<Position>>>>,
}

impl InMemoryPositionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a position as-is, without validation.
    ///
    /// Upload pipelines may hand over malformed rows; seeding them lets the
    /// matching pass be tested against such input.
    pub async fn insert(&self, position: Position) {
        self.tenders
            .write()
            .await
            .entry(position.tender_id)
            .or_default()
            .push(position);
    }

    pub async fn count(&self, tender_id: &TenderId) -> usize {
        self.tenders
            .read()
            .await
            .get(tender_id)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl PositionRepository for InMemoryPositionRepository {
    async fn list(&self, tender_id: &TenderId) -> Result<Vec<Position>, DomainError> {
        Ok(self
            .tenders
            .read()
            .await
            .get(tender_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get(&self, id: &PositionId) -> Result<Option<Position>, DomainError> {
        Ok(self
            .tenders
            .read()
            .await
            .values()
            .flatten()
            .find(|p| p.id == *id)
            .cloned())
    }

    async fn create(&self, tender_id: &TenderId, draft: PositionDraft) -> Result<Position, DomainError> {
        let position = Position::from_draft(PositionId::new(), *tender_id, draft);
        position.validate()?;
        self.insert(position.clone()).await;
        Ok(position)
    }
}
