//! Application layer - Commands and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.

pub mod handlers;
mod retry;

pub use handlers::{
    // Reconciliation handlers
    AutoMatchCommand, AutoMatchHandler, AutoMatchResult, RejectedPosition,
    ReassignMappingCommand, ReassignMappingHandler, ReassignMappingResult,
    SetMappingStatusCommand, SetMappingStatusHandler, SetMappingStatusResult,
    // Transfer handlers
    ApplyTransferCommand, ApplyTransferHandler, TransferSettings,
};
pub use retry::RetryPolicy;
