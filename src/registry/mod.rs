//! The `registry` module holds the master's in-memory topic table: which
//! nodes publish and which nodes subscribe each topic.
//!
//! It is the single source of truth for the graph. Callers go through
//! [`TopicRegistry`]'s operations and never touch entries directly.

pub mod entry;
pub mod store;

pub use entry::TopicRegistryEntry;
pub use store::{SystemState, TopicMembers, TopicRegistry, TopicSnapshot};
