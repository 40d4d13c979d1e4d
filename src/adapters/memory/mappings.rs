//! In-memory mapping repository.
//!
//! All mutations take the single write lock, build the next state on a
//! copy, check the new-position uniqueness constraint and only then swap
//! the copy in. A refused commit leaves the store untouched.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, MappingId, TenderId};
use crate::domain::reconciliation::{Mapping, MappingChangeSet, MappingSet};
use crate::ports::MappingRepository;

#[derive(Debug, Clone, Default)]
pub struct InMemoryMappingRepository {
    mappings: Arc<RwLock<Vec<Mapping>>>,
}

impl InMemoryMappingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.mappings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.mappings.read().await.is_empty()
    }
}

fn check_unique(mappings: &[Mapping], tenders: &HashSet<TenderId>) -> Result<(), DomainError> {
    for tender in tenders {
        let set: Vec<Mapping> = mappings
            .iter()
            .filter(|m| m.tenders().new == *tender)
            .cloned()
            .collect();
        MappingSet::new(set).verify_exclusivity()?;
    }
    Ok(())
}

fn persisted(mut mapping: Mapping) -> Mapping {
    mapping.mark_persisted();
    mapping
}

#[async_trait]
impl MappingRepository for InMemoryMappingRepository {
    async fn find_by_id(&self, id: &MappingId) -> Result<Option<Mapping>, DomainError> {
        Ok(self
            .mappings
            .read()
            .await
            .iter()
            .find(|m| m.id() == *id)
            .cloned())
    }

    async fn list_by_new_tender(&self, tender_id: &TenderId) -> Result<Vec<Mapping>, DomainError> {
        Ok(self
            .mappings
            .read()
            .await
            .iter()
            .filter(|m| m.tenders().new == *tender_id)
            .cloned()
            .collect())
    }

    async fn replace_for_tender(
        &self,
        tender_id: &TenderId,
        mappings: Vec<Mapping>,
    ) -> Result<Vec<Mapping>, DomainError> {
        if let Some(stray) = mappings.iter().find(|m| m.tenders().new != *tender_id) {
            return Err(DomainError::invalid_state(format!(
                "mapping {} belongs to tender {}, not {}",
                stray.id(),
                stray.tenders().new,
                tender_id
            )));
        }

        let stored: Vec<Mapping> = mappings.into_iter().map(persisted).collect();

        let mut guard = self.mappings.write().await;
        let mut next: Vec<Mapping> = guard
            .iter()
            .filter(|m| m.tenders().new != *tender_id)
            .cloned()
            .collect();
        next.extend(stored.iter().cloned());
        check_unique(&next, &HashSet::from([*tender_id]))?;

        *guard = next;
        Ok(stored)
    }

    async fn update(&self, mapping: &Mapping) -> Result<(), DomainError> {
        let mut guard = self.mappings.write().await;
        let index = guard
            .iter()
            .position(|m| m.id() == mapping.id())
            .ok_or_else(|| DomainError::not_found("Mapping", mapping.id()))?;

        let mut next = guard.clone();
        next[index] = persisted(mapping.clone());
        check_unique(&next, &HashSet::from([mapping.tenders().new]))?;

        *guard = next;
        Ok(())
    }

    async fn apply_changes(&self, changes: &MappingChangeSet) -> Result<(), DomainError> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut guard = self.mappings.write().await;
        let mut touched: HashSet<TenderId> = guard
            .iter()
            .filter(|m| changes.deletions.contains(&m.id()))
            .map(|m| m.tenders().new)
            .collect();

        let mut next: Vec<Mapping> = guard
            .iter()
            .filter(|m| !changes.deletions.contains(&m.id()))
            .cloned()
            .collect();
        for upsert in &changes.upserts {
            touched.insert(upsert.tenders().new);
            let stored = persisted(upsert.clone());
            match next.iter_mut().find(|m| m.id() == upsert.id()) {
                Some(slot) => *slot = stored,
                None => next.push(stored),
            }
        }
        check_unique(&next, &touched)?;

        *guard = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::PositionId;
    use crate::domain::reconciliation::{MatchScore, MappingType, TenderPair};
    use crate::domain::tender::{Position, PositionDraft, PositionSnapshot};

    fn snapshot(tender: TenderId, number: &str, name: &str) -> PositionSnapshot {
        Position::from_draft(PositionId::new(), tender, PositionDraft::new(number, name)).snapshot()
    }

    fn fuzzy(pair: TenderPair, old: PositionSnapshot, new: PositionSnapshot) -> Mapping {
        Mapping::matched(pair, old, new, MatchScore::zero(), MappingType::Fuzzy)
    }

    #[tokio::test]
    async fn replace_marks_mappings_persisted() {
        let repo = InMemoryMappingRepository::new();
        let pair = TenderPair::new(TenderId::new(), TenderId::new());
        let m = Mapping::created(pair, snapshot(pair.new, "1", "Фундамент"));
        assert!(!m.is_persisted());

        let stored = repo.replace_for_tender(&pair.new, vec![m.clone()]).await.unwrap();
        assert!(stored[0].is_persisted());
        assert!(repo.find_by_id(&m.id()).await.unwrap().unwrap().is_persisted());
    }

    #[tokio::test]
    async fn replace_swaps_only_the_given_tender() {
        let repo = InMemoryMappingRepository::new();
        let a = TenderPair::new(TenderId::new(), TenderId::new());
        let b = TenderPair::new(TenderId::new(), TenderId::new());
        repo.replace_for_tender(&a.new, vec![Mapping::created(a, snapshot(a.new, "1", "x"))])
            .await
            .unwrap();
        repo.replace_for_tender(&b.new, vec![Mapping::created(b, snapshot(b.new, "1", "y"))])
            .await
            .unwrap();

        repo.replace_for_tender(&a.new, vec![]).await.unwrap();
        assert!(repo.list_by_new_tender(&a.new).await.unwrap().is_empty());
        assert_eq!(repo.list_by_new_tender(&b.new).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_claim_is_refused_and_store_unchanged() {
        let repo = InMemoryMappingRepository::new();
        let pair = TenderPair::new(TenderId::new(), TenderId::new());
        let target = snapshot(pair.new, "1", "Фундамент");
        let first = fuzzy(pair, snapshot(pair.old, "1", "a"), target.clone());
        repo.replace_for_tender(&pair.new, vec![first.clone()]).await.unwrap();

        let second = fuzzy(pair, snapshot(pair.old, "2", "b"), target);
        let changes = MappingChangeSet {
            upserts: vec![second],
            deletions: vec![],
        };
        let err = repo.apply_changes(&changes).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn apply_changes_commits_upserts_and_deletions_together() {
        let repo = InMemoryMappingRepository::new();
        let pair = TenderPair::new(TenderId::new(), TenderId::new());
        let target = snapshot(pair.new, "3", "Крыша");
        let orphan = Mapping::created(pair, target.clone());
        let deleted = Mapping::deleted(pair, snapshot(pair.old, "2", "Стены"));
        repo.replace_for_tender(&pair.new, vec![orphan.clone(), deleted.clone()])
            .await
            .unwrap();

        let mut bound = deleted.clone();
        bound.bind_manual(target);
        repo.apply_changes(&MappingChangeSet {
            upserts: vec![bound],
            deletions: vec![orphan.id()],
        })
        .await
        .unwrap();

        let stored = repo.list_by_new_tender(&pair.new).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].mapping_type(), MappingType::Manual);
    }

    #[tokio::test]
    async fn update_of_unknown_mapping_is_not_found() {
        let repo = InMemoryMappingRepository::new();
        let pair = TenderPair::new(TenderId::new(), TenderId::new());
        let m = Mapping::created(pair, snapshot(pair.new, "1", "x"));
        let err = repo.update(&m).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}
