//! The full mapping collection of one new tender version.
//!
//! Reassignment is planned against the whole set in one pass and yields a
//! change set that the store commits atomically.

use std::collections::{HashMap, HashSet};

use super::{Mapping, MappingStatus, MappingType};
use crate::domain::foundation::{DomainError, MappingId, PositionId};
use crate::domain::tender::{Position, PositionSnapshot};

/// Mappings to write and remove in a single atomic commit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingChangeSet {
    /// Inserted or replaced mappings, matched by id.
    pub upserts: Vec<Mapping>,
    pub deletions: Vec<MappingId>,
}

impl MappingChangeSet {
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletions.is_empty()
    }

    /// Returns the mapping as it will look after the commit.
    pub fn upserted(&self, id: MappingId) -> Option<&Mapping> {
        self.upserts.iter().find(|m| m.id() == id)
    }
}

/// Snapshot of every mapping of one new tender.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingSet {
    mappings: Vec<Mapping>,
}

impl MappingSet {
    pub fn new(mappings: Vec<Mapping>) -> Self {
        Self { mappings }
    }

    pub fn get(&self, id: MappingId) -> Option<&Mapping> {
        self.mappings.iter().find(|m| m.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mapping> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn into_inner(self) -> Vec<Mapping> {
        self.mappings
    }

    /// The mapping currently claiming `position_id` as its new side.
    pub fn holder_of(&self, position_id: PositionId) -> Option<&Mapping> {
        self.mappings
            .iter()
            .find(|m| m.claims_new_position() && m.new_position_id() == Some(position_id))
    }

    /// Plans `reassign(mapping, target)`.
    ///
    /// 1. A different mapping holding `target` is removed if it only
    ///    represented the orphan, otherwise unbound to `deleted`.
    /// 2. The mapping is bound manually to `target`, or unbound when
    ///    `target` is `None`.
    /// 3. A new position the mapping gives up and nobody else holds gets a
    ///    fresh `new` mapping.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the mapping is not in the set
    /// - `InvalidState` if the mapping or the current holder of `target`
    ///   is applied, or the mapping has no old side to reassign
    pub fn plan_reassign(
        &self,
        mapping_id: MappingId,
        target: Option<PositionSnapshot>,
    ) -> Result<MappingChangeSet, DomainError> {
        let current = self
            .get(mapping_id)
            .ok_or_else(|| DomainError::not_found("Mapping", mapping_id))?;

        if current.status() == MappingStatus::Applied {
            return Err(DomainError::invalid_state(format!(
                "mapping {} is already applied",
                mapping_id
            )));
        }
        if current.mapping_type() == MappingType::Additional || current.old_position().is_none() {
            return Err(DomainError::invalid_state(format!(
                "mapping {} has no old position to reassign",
                mapping_id
            )));
        }

        let previous = current.new_position().cloned();
        let target_id = target.as_ref().map(|t| t.id);
        let mut changes = MappingChangeSet::default();

        if let Some(target_id) = target_id {
            if let Some(holder) = self
                .holder_of(target_id)
                .filter(|holder| holder.id() != mapping_id)
            {
                if holder.status() == MappingStatus::Applied {
                    return Err(DomainError::invalid_state(format!(
                        "position {} is held by applied mapping {}",
                        target_id,
                        holder.id()
                    )));
                }
                if holder.mapping_type() == MappingType::New {
                    changes.deletions.push(holder.id());
                } else {
                    let mut freed = holder.clone();
                    freed.unbind();
                    changes.upserts.push(freed);
                }
            }
        }

        let mut updated = current.clone();
        match target {
            Some(snapshot) => updated.bind_manual(snapshot),
            None => updated.unbind(),
        }
        changes.upserts.push(updated);

        if let Some(orphan) = previous.filter(|q| Some(q.id) != target_id) {
            if !self.is_claimed_after(orphan.id, &changes) {
                changes
                    .upserts
                    .push(Mapping::created(current.tenders(), orphan));
            }
        }

        Ok(changes)
    }

    fn is_claimed_after(&self, position_id: PositionId, changes: &MappingChangeSet) -> bool {
        let existing = self
            .mappings
            .iter()
            .filter(|m| !changes.deletions.contains(&m.id()))
            .map(|m| changes.upserted(m.id()).unwrap_or(m));
        let inserted = changes
            .upserts
            .iter()
            .filter(|u| self.get(u.id()).is_none());

        existing
            .chain(inserted)
            .any(|m| m.claims_new_position() && m.new_position_id() == Some(position_id))
    }

    /// Commits a change set to this in-memory view.
    pub fn apply(&mut self, changes: &MappingChangeSet) {
        self.mappings
            .retain(|m| !changes.deletions.contains(&m.id()));
        for upsert in &changes.upserts {
            match self.mappings.iter_mut().find(|m| m.id() == upsert.id()) {
                Some(slot) => *slot = upsert.clone(),
                None => self.mappings.push(upsert.clone()),
            }
        }
    }

    /// Checks that no new position is claimed by more than one mapping.
    ///
    /// # Errors
    ///
    /// - `Conflict` naming the first doubly-claimed position
    pub fn verify_exclusivity(&self) -> Result<(), DomainError> {
        let mut seen = HashSet::new();
        for mapping in self.mappings.iter().filter(|m| m.claims_new_position()) {
            if let Some(id) = mapping.new_position_id() {
                if !seen.insert(id) {
                    return Err(DomainError::conflict(format!(
                        "new position {} is claimed by more than one mapping",
                        id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Checks that every non-additional position of both versions appears in
    /// exactly one mapping and that no mapping points at an unknown position.
    ///
    /// # Errors
    ///
    /// - `InvalidState` describing the first violation found
    pub fn verify_completeness(
        &self,
        old_positions: &[Position],
        new_positions: &[Position],
    ) -> Result<(), DomainError> {
        let mut old_counts: HashMap<PositionId, usize> = HashMap::new();
        let mut new_counts: HashMap<PositionId, usize> = HashMap::new();
        for mapping in self
            .mappings
            .iter()
            .filter(|m| m.mapping_type() != MappingType::Additional)
        {
            if let Some(id) = mapping.old_position_id() {
                *old_counts.entry(id).or_default() += 1;
            }
            if let Some(id) = mapping.new_position_id() {
                *new_counts.entry(id).or_default() += 1;
            }
        }

        check_side("old", old_positions, &old_counts)?;
        check_side("new", new_positions, &new_counts)
    }
}

fn check_side(
    side: &str,
    positions: &[Position],
    counts: &HashMap<PositionId, usize>,
) -> Result<(), DomainError> {
    let regular: HashSet<PositionId> = positions
        .iter()
        .filter(|p| !p.is_additional)
        .map(|p| p.id)
        .collect();

    for id in &regular {
        let count = counts.get(id).copied().unwrap_or(0);
        if count != 1 {
            return Err(DomainError::invalid_state(format!(
                "{} position {} appears in {} mappings",
                side, id, count
            )));
        }
    }
    if let Some(unknown) = counts.keys().find(|id| !regular.contains(id)) {
        return Err(DomainError::invalid_state(format!(
            "mapping references unknown {} position {}",
            side, unknown
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::TenderId;
    use crate::domain::reconciliation::{
        auto_match, MappingAction, MatchScore, MatchingOptions, TenderPair,
    };
    use crate::domain::tender::PositionDraft;

    struct Fixture {
        old: Vec<Position>,
        new: Vec<Position>,
        set: MappingSet,
    }

    fn fixture() -> Fixture {
        let pair = TenderPair::new(TenderId::new(), TenderId::new());
        fn make(tender: TenderId, rows: &[(&str, &str)]) -> Vec<Position> {
            rows.iter()
                .map(|(n, s)| Position::from_draft(PositionId::new(), tender, PositionDraft::new(*n, *s)))
                .collect()
        }
        let old = make(pair.old, &[("1", "Фундамент"), ("2", "Стены"), ("3", "Перекрытия")]);
        let new = make(pair.new, &[("1", "Фундамент"), ("2", "Стены"), ("9", "Крыша")]);
        let set = MappingSet::new(
            auto_match(&old, &new, &MatchingOptions::default()).into_mappings(pair),
        );
        Fixture { old, new, set }
    }

    fn mapping_for_old<'a>(set: &'a MappingSet, old: &Position) -> &'a Mapping {
        set.iter()
            .find(|m| m.old_position_id() == Some(old.id))
            .unwrap()
    }

    #[test]
    fn auto_matched_set_satisfies_invariants() {
        let f = fixture();
        f.set.verify_exclusivity().unwrap();
        f.set.verify_completeness(&f.old, &f.new).unwrap();
    }

    #[test]
    fn reassign_steals_position_from_matched_mapping() {
        let mut f = fixture();
        let a = mapping_for_old(&f.set, &f.old[0]).id();
        let b = mapping_for_old(&f.set, &f.old[2]).id();
        let p = f.new[0].snapshot();

        let changes = f.set.plan_reassign(b, Some(p.clone())).unwrap();
        f.set.apply(&changes);

        let b = f.set.get(b).unwrap();
        assert_eq!(b.new_position_id(), Some(p.id));
        assert_eq!(b.mapping_type(), MappingType::Manual);
        assert_eq!(b.status(), MappingStatus::Confirmed);
        assert_eq!(b.confidence(), 1.0);

        let a = f.set.get(a).unwrap();
        assert!(a.new_position().is_none());
        assert_eq!(a.mapping_type(), MappingType::Deleted);
        assert_eq!(a.status(), MappingStatus::Suggested);
        assert_eq!(a.confidence(), 0.0);

        f.set.verify_exclusivity().unwrap();
        f.set.verify_completeness(&f.old, &f.new).unwrap();
    }

    #[test]
    fn reassign_onto_orphan_deletes_its_new_mapping() {
        let mut f = fixture();
        let roof = f.new[2].snapshot();
        let orphan = f.set.holder_of(roof.id).unwrap().id();
        let m = mapping_for_old(&f.set, &f.old[2]).id();

        let changes = f.set.plan_reassign(m, Some(roof.clone())).unwrap();
        assert_eq!(changes.deletions, vec![orphan]);
        f.set.apply(&changes);

        assert!(f.set.get(orphan).is_none());
        assert_eq!(f.set.holder_of(roof.id).unwrap().id(), m);
        f.set.verify_completeness(&f.old, &f.new).unwrap();
    }

    #[test]
    fn giving_up_a_position_synthesizes_new_mapping() {
        let mut f = fixture();
        let m = mapping_for_old(&f.set, &f.old[1]).id();
        let walls = f.new[1].id;
        let before = f.set.len();

        let changes = f.set.plan_reassign(m, None).unwrap();
        f.set.apply(&changes);

        let m = f.set.get(m).unwrap();
        assert_eq!(m.mapping_type(), MappingType::Deleted);
        assert_eq!(m.action(), MappingAction::Delete);
        let holder = f.set.holder_of(walls).unwrap();
        assert_eq!(holder.mapping_type(), MappingType::New);
        assert_eq!(holder.action(), MappingAction::CreateNew);
        assert_eq!(f.set.len(), before + 1);
        f.set.verify_completeness(&f.old, &f.new).unwrap();
    }

    #[test]
    fn swapping_two_matches_keeps_bijection() {
        let mut f = fixture();
        let first = mapping_for_old(&f.set, &f.old[0]).id();
        let second = mapping_for_old(&f.set, &f.old[1]).id();

        let changes = f.set.plan_reassign(first, Some(f.new[1].snapshot())).unwrap();
        f.set.apply(&changes);
        let changes = f.set.plan_reassign(second, Some(f.new[0].snapshot())).unwrap();
        f.set.apply(&changes);

        assert_eq!(f.set.get(first).unwrap().new_position_id(), Some(f.new[1].id));
        assert_eq!(f.set.get(second).unwrap().new_position_id(), Some(f.new[0].id));
        f.set.verify_exclusivity().unwrap();
        f.set.verify_completeness(&f.old, &f.new).unwrap();
    }

    #[test]
    fn reassign_to_same_position_only_confirms() {
        let f = fixture();
        let m = mapping_for_old(&f.set, &f.old[0]);
        let changes = f
            .set
            .plan_reassign(m.id(), Some(f.new[0].snapshot()))
            .unwrap();
        assert_eq!(changes.upserts.len(), 1);
        assert!(changes.deletions.is_empty());
        assert_eq!(changes.upserts[0].mapping_type(), MappingType::Manual);
    }

    #[test]
    fn applied_mapping_cannot_be_reassigned() {
        let mut f = fixture();
        let m = mapping_for_old(&f.set, &f.old[0]).clone();
        let mut applied = m.clone();
        applied.set_status(MappingStatus::Applied).unwrap();
        f.set.apply(&MappingChangeSet {
            upserts: vec![applied],
            deletions: vec![],
        });

        let err = f.set.plan_reassign(m.id(), None).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn new_type_mapping_cannot_be_reassigned() {
        let f = fixture();
        let orphan = f.set.holder_of(f.new[2].id).unwrap().id();
        let err = f.set.plan_reassign(orphan, None).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn unknown_mapping_is_not_found() {
        let f = fixture();
        let err = f.set.plan_reassign(MappingId::new(), None).unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[test]
    fn exclusivity_check_detects_double_claim() {
        let f = fixture();
        let pair = f.set.iter().next().unwrap().tenders();
        let mut mappings = f.set.clone().into_inner();
        mappings.push(Mapping::matched(
            pair,
            f.old[2].snapshot(),
            f.new[0].snapshot(),
            MatchScore::zero(),
            MappingType::Fuzzy,
        ));
        let err = MappingSet::new(mappings).verify_exclusivity().unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn completeness_check_detects_missing_position() {
        let f = fixture();
        let mut old = f.old.clone();
        old.push(Position::from_draft(
            PositionId::new(),
            TenderId::new(),
            PositionDraft::new("4", "Лестницы"),
        ));
        assert!(f.set.verify_completeness(&old, &f.new).is_err());
    }
}
