//! Reconciliation command handlers.

mod auto_match;
mod reassign_mapping;
mod set_mapping_status;

pub use auto_match::{AutoMatchCommand, AutoMatchHandler, AutoMatchResult, RejectedPosition};
pub use reassign_mapping::{ReassignMappingCommand, ReassignMappingHandler, ReassignMappingResult};
pub use set_mapping_status::{
    SetMappingStatusCommand, SetMappingStatusHandler, SetMappingStatusResult,
};
