//! Tender Reconciliation - carries priced bill-of-quantities content from
//! one tender version to the next.
//!
//! Positions of the new version are matched against its predecessor by a
//! weighted similarity score, reviewed by hand, and then the line items and
//! links of every confirmed pair are copied across by a bounded worker pool.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
