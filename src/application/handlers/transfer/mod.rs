//! Transfer command handlers.

mod apply_transfer;

pub use apply_transfer::{ApplyTransferCommand, ApplyTransferHandler, TransferSettings};
