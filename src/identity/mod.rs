//! The `identity` module defines the value types that name participants of
//! the graph: nodes, topics, publishers, and the subscriber-side record of
//! established connections.
//!
//! All identifiers use structural equality and hashing over exactly their
//! declared fields, so they can be used directly as set and map keys.

pub mod node;
pub mod publisher;
pub mod subscriber;
pub mod topic;

pub use node::NodeIdentifier;
pub use publisher::PublisherIdentifier;
pub use subscriber::SubscriberRecord;
pub use topic::TopicDefinition;

#[cfg(test)]
mod tests;
