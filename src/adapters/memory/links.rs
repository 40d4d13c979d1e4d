//! In-memory item link repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::FaultInjector;
use crate::domain::foundation::{DomainError, PositionId};
use crate::domain::tender::{IdTranslation, ItemLink};
use crate::ports::LinkRepository;

#[derive(Debug, Clone, Default)]
pub struct InMemoryLinkRepository {
    links: Arc<RwLock<HashMap<PositionId, Vec<ItemLink>>>>,
    faults: FaultInjector,
}

impl InMemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_faults(faults: FaultInjector) -> Self {
        Self {
            links: Arc::default(),
            faults,
        }
    }

    pub async fn insert(&self, link: ItemLink) {
        self.links
            .write()
            .await
            .entry(link.position_id)
            .or_default()
            .push(link);
    }

    pub async fn count(&self, position_id: &PositionId) -> usize {
        self.links
            .read()
            .await
            .get(position_id)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn list(&self, position_id: &PositionId) -> Result<Vec<ItemLink>, DomainError> {
        Ok(self
            .links
            .read()
            .await
            .get(position_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn copy(
        &self,
        link: &ItemLink,
        translation: &IdTranslation,
    ) -> Result<Option<ItemLink>, DomainError> {
        let Some(copy) = translation.translate_link(link) else {
            return Ok(None);
        };
        self.faults.before_write(copy.position_id).await?;
        self.insert(copy.clone()).await;
        Ok(Some(copy))
    }
}
