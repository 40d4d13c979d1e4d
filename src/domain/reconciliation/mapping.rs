//! Mapping - correspondence between an old-version and a new-version position.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::MatchScore;
use crate::domain::foundation::{
    DomainError, MappingId, PositionId, StateMachine, TenderId, Timestamp,
};
use crate::domain::tender::PositionSnapshot;

/// How a mapping came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingType {
    /// Auto-matched at or above the auto-confirm threshold.
    Exact,
    /// Auto-matched below the auto-confirm threshold.
    Fuzzy,
    /// Bound by a person.
    Manual,
    /// New position with no predecessor.
    New,
    /// Old position with no successor.
    Deleted,
    /// Out-of-structure position carried forward without matching.
    Additional,
}

impl MappingType {
    /// Returns true if the mapping pairs an old position with a new one.
    pub fn is_match(&self) -> bool {
        matches!(self, MappingType::Exact | MappingType::Fuzzy | MappingType::Manual)
    }
}

impl fmt::Display for MappingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MappingType::Exact => "exact",
            MappingType::Fuzzy => "fuzzy",
            MappingType::Manual => "manual",
            MappingType::New => "new",
            MappingType::Deleted => "deleted",
            MappingType::Additional => "additional",
        };
        write!(f, "{}", s)
    }
}

/// Review status of a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MappingStatus {
    #[default]
    Suggested,
    Confirmed,
    Rejected,
    Applied,
}

impl StateMachine for MappingStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use MappingStatus::*;
        matches!(
            (self, target),
            (Suggested, Confirmed)
                | (Suggested, Rejected)
                | (Suggested, Applied)
                | (Confirmed, Applied)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use MappingStatus::*;
        match self {
            Suggested => vec![Confirmed, Rejected, Applied],
            Confirmed => vec![Applied],
            Rejected => vec![],
            Applied => vec![],
        }
    }
}

impl fmt::Display for MappingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MappingStatus::Suggested => "suggested",
            MappingStatus::Confirmed => "confirmed",
            MappingStatus::Rejected => "rejected",
            MappingStatus::Applied => "applied",
        };
        write!(f, "{}", s)
    }
}

/// What the transfer step does with a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingAction {
    /// Copy BOQ items and links from the old position to the new one.
    CopyChildren,
    CreateNew,
    Delete,
    PreserveAdditional,
}

impl MappingAction {
    /// Returns true if applying the mapping involves no row copying.
    pub fn is_bookkeeping(&self) -> bool {
        !matches!(self, MappingAction::CopyChildren)
    }
}

/// Old and new tender versions a mapping belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenderPair {
    pub old: TenderId,
    pub new: TenderId,
}

impl TenderPair {
    pub fn new(old: TenderId, new: TenderId) -> Self {
        Self { old, new }
    }
}

/// A correspondence record.
///
/// # Invariants
///
/// - `id` is assigned at construction; `persisted` tells whether the
///   store has accepted it
/// - a `new`-type mapping has only a new side; `deleted` only an old side
/// - `applied` is terminal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    id: MappingId,
    #[serde(default)]
    persisted: bool,
    tenders: TenderPair,
    old_position: Option<PositionSnapshot>,
    new_position: Option<PositionSnapshot>,
    mapping_type: MappingType,
    score: MatchScore,
    status: MappingStatus,
    action: MappingAction,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Mapping {
    #[allow(clippy::too_many_arguments)]
    fn build(
        tenders: TenderPair,
        old_position: Option<PositionSnapshot>,
        new_position: Option<PositionSnapshot>,
        mapping_type: MappingType,
        score: MatchScore,
        status: MappingStatus,
        action: MappingAction,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: MappingId::new(),
            persisted: false,
            tenders,
            old_position,
            new_position,
            mapping_type,
            score,
            status,
            action,
            created_at: now,
            updated_at: now,
        }
    }

    /// Auto-matched pair. Exact matches start confirmed, fuzzy ones suggested.
    pub fn matched(
        tenders: TenderPair,
        old: PositionSnapshot,
        new: PositionSnapshot,
        score: MatchScore,
        mapping_type: MappingType,
    ) -> Self {
        let status = if mapping_type == MappingType::Exact {
            MappingStatus::Confirmed
        } else {
            MappingStatus::Suggested
        };
        Self::build(
            tenders,
            Some(old),
            Some(new),
            mapping_type,
            score,
            status,
            MappingAction::CopyChildren,
        )
    }

    /// Old position without a successor.
    pub fn deleted(tenders: TenderPair, old: PositionSnapshot) -> Self {
        Self::build(
            tenders,
            Some(old),
            None,
            MappingType::Deleted,
            MatchScore::zero(),
            MappingStatus::Suggested,
            MappingAction::Delete,
        )
    }

    /// New position without a predecessor.
    pub fn created(tenders: TenderPair, new: PositionSnapshot) -> Self {
        Self::build(
            tenders,
            None,
            Some(new),
            MappingType::New,
            MatchScore::zero(),
            MappingStatus::Suggested,
            MappingAction::CreateNew,
        )
    }

    /// Additional position of either version, carried forward untouched.
    pub fn additional(
        tenders: TenderPair,
        old: Option<PositionSnapshot>,
        new: Option<PositionSnapshot>,
    ) -> Self {
        Self::build(
            tenders,
            old,
            new,
            MappingType::Additional,
            MatchScore::zero(),
            MappingStatus::Suggested,
            MappingAction::PreserveAdditional,
        )
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> MappingId {
        self.id
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub fn tenders(&self) -> TenderPair {
        self.tenders
    }

    pub fn old_position(&self) -> Option<&PositionSnapshot> {
        self.old_position.as_ref()
    }

    pub fn new_position(&self) -> Option<&PositionSnapshot> {
        self.new_position.as_ref()
    }

    pub fn old_position_id(&self) -> Option<PositionId> {
        self.old_position.as_ref().map(|p| p.id)
    }

    pub fn new_position_id(&self) -> Option<PositionId> {
        self.new_position.as_ref().map(|p| p.id)
    }

    pub fn mapping_type(&self) -> MappingType {
        self.mapping_type
    }

    pub fn score(&self) -> &MatchScore {
        &self.score
    }

    pub fn confidence(&self) -> f64 {
        self.score.confidence
    }

    pub fn status(&self) -> MappingStatus {
        self.status
    }

    pub fn action(&self) -> MappingAction {
        self.action
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    /// Returns true if the mapping takes part in the exclusivity invariant.
    pub fn claims_new_position(&self) -> bool {
        self.mapping_type != MappingType::Additional && self.new_position.is_some()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────

    /// Marks the mapping as accepted by the store.
    pub fn mark_persisted(&mut self) {
        self.persisted = true;
    }

    /// Moves the status forward.
    ///
    /// Returns `Ok(false)` when the mapping already has `target`.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the state machine forbids the transition
    pub fn set_status(&mut self, target: MappingStatus) -> Result<bool, DomainError> {
        if self.status == target {
            return Ok(false);
        }
        self.status = self
            .status
            .transition_to(target)
            .map_err(|e| DomainError::invalid_state(e.to_string()))?;
        self.touch();
        Ok(true)
    }

    /// Binds the mapping to `new` on a person's authority.
    pub fn bind_manual(&mut self, new: PositionSnapshot) {
        self.new_position = Some(new);
        self.mapping_type = MappingType::Manual;
        self.score = MatchScore::certain();
        self.status = MappingStatus::Confirmed;
        self.action = MappingAction::CopyChildren;
        self.touch();
    }

    /// Clears the new side, leaving the old position marked as deleted.
    pub fn unbind(&mut self) {
        self.new_position = None;
        self.mapping_type = MappingType::Deleted;
        self.score = MatchScore::zero();
        self.status = MappingStatus::Suggested;
        self.action = MappingAction::Delete;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}
