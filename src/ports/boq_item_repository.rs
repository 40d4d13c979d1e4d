//! BOQ item repository port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, PositionId};
use crate::domain::tender::BoqItem;

/// Persistence of the priced line items owned by positions.
#[async_trait]
pub trait BoqItemRepository: Send + Sync {
    /// Lists the items owned by a position, oldest first.
    async fn list(&self, position_id: &PositionId) -> Result<Vec<BoqItem>, DomainError>;

    /// Copies `item` under `new_position_id`.
    ///
    /// The copy keeps every field except identity and timestamps.
    ///
    /// # Errors
    ///
    /// - `TransientStorage` on a retryable write failure
    /// - `Storage` on any other persistence failure
    async fn copy(&self, item: &BoqItem, new_position_id: PositionId) -> Result<BoqItem, DomainError>;
}
