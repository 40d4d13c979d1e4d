//! Mapping repository port (write side).
//!
//! Defines the contract for persisting the mapping set of a tender.
//!
//! # Design
//!
//! - **Set-scoped**: mappings are grouped by their new tender version
//! - **Atomic**: bulk replacement and change sets commit all-or-nothing
//! - **Constrained**: a non-additional new position may be claimed by at
//!   most one stored mapping

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, MappingId, TenderId};
use crate::domain::reconciliation::{Mapping, MappingChangeSet};

/// Repository port for Mapping persistence.
///
/// Implementations must ensure:
/// - Stored mappings come back with `is_persisted() == true`
/// - A commit that would break new-position uniqueness is refused with
///   `Conflict` and leaves the store unchanged
#[async_trait]
pub trait MappingRepository: Send + Sync {
    /// Find a mapping by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &MappingId) -> Result<Option<Mapping>, DomainError>;

    /// All mappings of a new tender version, in insertion order.
    async fn list_by_new_tender(&self, tender_id: &TenderId) -> Result<Vec<Mapping>, DomainError>;

    /// Replaces the whole mapping set of a new tender version.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the mappings claim a new position twice
    /// - `Storage` on persistence failure
    async fn replace_for_tender(
        &self,
        tender_id: &TenderId,
        mappings: Vec<Mapping>,
    ) -> Result<Vec<Mapping>, DomainError>;

    /// Update an existing mapping.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the mapping doesn't exist
    /// - `Conflict` if the update breaks new-position uniqueness
    /// - `TransientStorage` / `Storage` on persistence failure
    async fn update(&self, mapping: &Mapping) -> Result<(), DomainError>;

    /// Commits a change set atomically.
    ///
    /// Either every upsert and deletion becomes visible or none does.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the result would break new-position uniqueness
    /// - `Storage` on persistence failure
    async fn apply_changes(&self, changes: &MappingChangeSet) -> Result<(), DomainError>;
}
