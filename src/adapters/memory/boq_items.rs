//! In-memory BOQ item repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::FaultInjector;
use crate::domain::foundation::{DomainError, PositionId};
use crate::domain::tender::BoqItem;
use crate::ports::BoqItemRepository;

#[derive(Debug, Clone, Default)]
pub struct InMemoryBoqItemRepository {
    items: Arc<RwLock<HashMap<PositionId, Vec<BoqItem>>>>,
    faults: FaultInjector,
}

impl InMemoryBoqItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shares `faults` with the caller; copies consult it before writing.
    pub fn with_faults(faults: FaultInjector) -> Self {
        Self {
            items: Arc::default(),
            faults,
        }
    }

    pub async fn insert(&self, item: BoqItem) {
        self.items
            .write()
            .await
            .entry(item.position_id)
            .or_default()
            .push(item);
    }

    pub async fn count(&self, position_id: &PositionId) -> usize {
        self.items
            .read()
            .await
            .get(position_id)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl BoqItemRepository for InMemoryBoqItemRepository {
    async fn list(&self, position_id: &PositionId) -> Result<Vec<BoqItem>, DomainError> {
        Ok(self
            .items
            .read()
            .await
            .get(position_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn copy(&self, item: &BoqItem, new_position_id: PositionId) -> Result<BoqItem, DomainError> {
        self.faults.before_write(new_position_id).await?;
        let copy = item.duplicate_for(new_position_id);
        self.insert(copy.clone()).await;
        Ok(copy)
    }
}
