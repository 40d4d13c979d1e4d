//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, errors, events, state machine)
//! - `tender` - Positions, BOQ items and item links
//! - `reconciliation` - Scoring, matching and the mapping model
//! - `transfer` - Transfer bookkeeping (progress, result report)

pub mod foundation;
pub mod reconciliation;
pub mod tender;
pub mod transfer;
