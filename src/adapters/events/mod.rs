//! Event bus adapters.
//!
//! - `InMemoryEventBus` - In-process bus that records published events

mod in_memory;

pub use in_memory::InMemoryEventBus;
