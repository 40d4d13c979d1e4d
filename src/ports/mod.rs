//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the reconciliation core and the storage layer. Adapters implement these
//! ports.
//!
//! ## Tender Ports
//!
//! - `PositionRepository` - Positions of a tender version
//! - `BoqItemRepository` - Priced line items owned by positions
//! - `LinkRepository` - Links between line items
//!
//! ## Reconciliation Ports
//!
//! - `MappingRepository` - Mapping sets with a new-position uniqueness constraint
//!
//! ## Event Ports
//!
//! - `EventPublisher` - Port for publishing domain events

mod boq_item_repository;
mod event_publisher;
mod link_repository;
mod mapping_repository;
mod position_repository;

pub use boq_item_repository::BoqItemRepository;
pub use event_publisher::EventPublisher;
pub use link_repository::LinkRepository;
pub use mapping_repository::MappingRepository;
pub use position_repository::PositionRepository;
