//! Item link repository port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, PositionId};
use crate::domain::tender::{IdTranslation, ItemLink};

/// Persistence of links between BOQ items of one position.
#[async_trait]
pub trait LinkRepository: Send + Sync {
    async fn list(&self, position_id: &PositionId) -> Result<Vec<ItemLink>, DomainError>;

    /// Copies `link` under the translation's new position, rewriting both
    /// endpoints through the translation table.
    ///
    /// Returns `None` without writing anything when either endpoint has no
    /// translation.
    async fn copy(
        &self,
        link: &ItemLink,
        translation: &IdTranslation,
    ) -> Result<Option<ItemLink>, DomainError>;
}
