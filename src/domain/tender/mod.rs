//! Tender structure: positions and the BOQ records they own.

mod boq_item;
mod position;

pub use boq_item::{BoqItem, IdTranslation, ItemLink};
pub use position::{Position, PositionDraft, PositionKind, PositionSnapshot};
