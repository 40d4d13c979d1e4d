//! Greedy auto-matching of old positions onto new positions.
//!
//! Old positions are visited in their original order; each claims the
//! best-scoring new position still in the pool. Ties go to the earliest
//! new position. The traversal order is part of the contract: reordering
//! it changes results.

use serde::{Deserialize, Serialize};

use super::scorer::{composite, MatchScore, ScoreWeights};
use super::{Mapping, MappingType, TenderPair};
use crate::domain::foundation::ValidationError;
use crate::domain::tender::{Position, PositionSnapshot};

/// Tuning knobs of the auto-matching pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchingOptions {
    pub weights: ScoreWeights,
    /// Minimum score for a pair to be matched at all.
    pub match_threshold: f64,
    /// Minimum score for a match to be exact and pre-confirmed.
    pub auto_confirm_threshold: f64,
}

impl Default for MatchingOptions {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            match_threshold: 0.5,
            auto_confirm_threshold: 0.9,
        }
    }
}

impl MatchingOptions {
    /// Checks that thresholds lie in [0, 1] and are ordered, and that the
    /// weights are finite and non-negative.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("match_threshold", self.match_threshold),
            ("auto_confirm_threshold", self.auto_confirm_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::out_of_range(field, 0.0, 1.0, value));
            }
        }
        if self.match_threshold > self.auto_confirm_threshold {
            return Err(ValidationError::invalid_format(
                "match_threshold",
                "must not exceed auto_confirm_threshold",
            ));
        }
        for (field, value) in [
            ("text_weight", self.weights.text),
            ("context_weight", self.weights.context),
            ("type_weight", self.weights.kind),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::invalid_format(
                    field,
                    "must be a finite, non-negative number",
                ));
            }
        }
        Ok(())
    }

    /// Classifies a composite score; `None` means "no match".
    pub fn classify(&self, confidence: f64) -> Option<MappingType> {
        if confidence >= self.auto_confirm_threshold {
            Some(MappingType::Exact)
        } else if confidence >= self.match_threshold {
            Some(MappingType::Fuzzy)
        } else {
            None
        }
    }
}

/// Version a position belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionSide {
    Old,
    New,
}

/// One decision of the matching pass.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchEntry {
    Matched {
        old: PositionSnapshot,
        new: PositionSnapshot,
        score: MatchScore,
        mapping_type: MappingType,
    },
    Deleted {
        old: PositionSnapshot,
    },
    Created {
        new: PositionSnapshot,
    },
    Additional {
        position: PositionSnapshot,
        side: VersionSide,
    },
}

/// Result of one matching pass, in emission order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchOutcome {
    pub entries: Vec<MatchEntry>,
}

impl MatchOutcome {
    pub fn matched_count(&self) -> usize {
        self.count(|e| matches!(e, MatchEntry::Matched { .. }))
    }

    pub fn exact_count(&self) -> usize {
        self.count(|e| {
            matches!(
                e,
                MatchEntry::Matched {
                    mapping_type: MappingType::Exact,
                    ..
                }
            )
        })
    }

    pub fn deleted_count(&self) -> usize {
        self.count(|e| matches!(e, MatchEntry::Deleted { .. }))
    }

    pub fn created_count(&self) -> usize {
        self.count(|e| matches!(e, MatchEntry::Created { .. }))
    }

    pub fn additional_count(&self) -> usize {
        self.count(|e| matches!(e, MatchEntry::Additional { .. }))
    }

    fn count(&self, predicate: impl Fn(&MatchEntry) -> bool) -> usize {
        self.entries.iter().filter(|e| predicate(e)).count()
    }

    /// Turns each decision into a fresh, not yet persisted mapping.
    pub fn into_mappings(self, tenders: TenderPair) -> Vec<Mapping> {
        self.entries
            .into_iter()
            .map(|entry| match entry {
                MatchEntry::Matched {
                    old,
                    new,
                    score,
                    mapping_type,
                } => Mapping::matched(tenders, old, new, score, mapping_type),
                MatchEntry::Deleted { old } => Mapping::deleted(tenders, old),
                MatchEntry::Created { new } => Mapping::created(tenders, new),
                MatchEntry::Additional {
                    position,
                    side: VersionSide::Old,
                } => Mapping::additional(tenders, Some(position), None),
                MatchEntry::Additional {
                    position,
                    side: VersionSide::New,
                } => Mapping::additional(tenders, None, Some(position)),
            })
            .collect()
    }
}

/// Matches `old` onto `new`.
///
/// Additional positions of either side bypass matching and are emitted
/// last, as `Additional` entries.
pub fn auto_match(old: &[Position], new: &[Position], options: &MatchingOptions) -> MatchOutcome {
    let candidates: Vec<&Position> = new.iter().filter(|p| !p.is_additional).collect();
    let mut claimed = vec![false; candidates.len()];
    let mut entries = Vec::with_capacity(old.len() + new.len());

    for old_position in old.iter().filter(|p| !p.is_additional) {
        let mut best: Option<(usize, MatchScore)> = None;

        for (ci, candidate) in candidates.iter().enumerate() {
            if claimed[ci] {
                continue;
            }
            let score = composite(old_position, candidate, &options.weights);
            let better = match &best {
                Some((_, current)) => score.confidence > current.confidence,
                None => true,
            };
            if better {
                best = Some((ci, score));
            }
        }

        let decision = best.and_then(|(ci, score)| {
            options
                .classify(score.confidence)
                .map(|mapping_type| (ci, score, mapping_type))
        });

        match decision {
            Some((ci, score, mapping_type)) => {
                claimed[ci] = true;
                entries.push(MatchEntry::Matched {
                    old: old_position.snapshot(),
                    new: candidates[ci].snapshot(),
                    score,
                    mapping_type,
                });
            }
            None => entries.push(MatchEntry::Deleted {
                old: old_position.snapshot(),
            }),
        }
    }

    for (ci, candidate) in candidates.iter().enumerate() {
        if !claimed[ci] {
            entries.push(MatchEntry::Created {
                new: candidate.snapshot(),
            });
        }
    }

    for (side, positions) in [(VersionSide::Old, old), (VersionSide::New, new)] {
        for position in positions.iter().filter(|p| p.is_additional) {
            entries.push(MatchEntry::Additional {
                position: position.snapshot(),
                side,
            });
        }
    }

    MatchOutcome { entries }
}
