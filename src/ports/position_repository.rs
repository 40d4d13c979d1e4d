//! Position repository port.
//!
//! Positions are owned by the upload pipeline; the reconciliation engine
//! only reads them and creates the occasional position on request.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, PositionId, TenderId};
use crate::domain::tender::{Position, PositionDraft};

/// Read access to the positions of a tender version.
#[async_trait]
pub trait PositionRepository: Send + Sync {
    /// Lists a tender's positions in their structural order.
    ///
    /// Order matters: the auto-matching pass visits old positions in the
    /// order returned here.
    async fn list(&self, tender_id: &TenderId) -> Result<Vec<Position>, DomainError>;

    /// Finds a position by id.
    ///
    /// Returns `None` if not found.
    async fn get(&self, id: &PositionId) -> Result<Option<Position>, DomainError>;

    /// Creates a position at the end of a tender.
    ///
    /// # Errors
    ///
    /// - `Validation` if the draft has no name or a bad volume
    /// - `TransientStorage` / `Storage` on persistence failure
    async fn create(&self, tender_id: &TenderId, draft: PositionDraft) -> Result<Position, DomainError>;
}
