//! Tender version reconciliation.
//!
//! - `scorer` - pure similarity functions and the composite score
//! - `matcher` - greedy auto-matching pass
//! - `mapping` - the Mapping record and its status state machine
//! - `mapping_set` - reassignment planning and invariant checks
//! - `events` - events published by the reconciliation handlers

mod events;
mod mapping;
mod mapping_set;
mod matcher;
pub mod scorer;

pub use events::{MappingReassigned, MappingStatusChanged, MappingsGenerated};
pub use mapping::{Mapping, MappingAction, MappingStatus, MappingType, TenderPair};
pub use mapping_set::{MappingChangeSet, MappingSet};
pub use matcher::{auto_match, MatchEntry, MatchOutcome, MatchingOptions, VersionSide};
pub use scorer::{MatchScore, ScoreWeights};
