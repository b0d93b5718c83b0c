use std::collections::HashSet;

use super::node::NodeIdentifier;
use super::publisher::PublisherIdentifier;
use super::topic::TopicDefinition;

/// The subscribing node's view of which publishers it is attached to.
///
/// Only the owning subscriber mutates `connected_publishers`; the master never
/// sees this record.
#[derive(Debug, Clone)]
pub struct SubscriberRecord {
    node: NodeIdentifier,
    topic: TopicDefinition,
    connected_publishers: HashSet<PublisherIdentifier>,
}

impl SubscriberRecord {
    pub fn new(node: NodeIdentifier, topic: TopicDefinition) -> Self {
        Self {
            node,
            topic,
            connected_publishers: HashSet::new(),
        }
    }

    pub fn node(&self) -> &NodeIdentifier {
        &self.node
    }

    pub fn topic(&self) -> &TopicDefinition {
        &self.topic
    }

    pub fn is_connected(&self, publisher: &PublisherIdentifier) -> bool {
        self.connected_publishers.contains(publisher)
    }

    /// Returns `false` if the publisher was already recorded.
    pub fn add(&mut self, publisher: PublisherIdentifier) -> bool {
        self.connected_publishers.insert(publisher)
    }

    pub fn remove(&mut self, publisher: &PublisherIdentifier) -> bool {
        self.connected_publishers.remove(publisher)
    }

    pub fn connected_publishers(&self) -> impl Iterator<Item = &PublisherIdentifier> {
        self.connected_publishers.iter()
    }

    pub fn len(&self) -> usize {
        self.connected_publishers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connected_publishers.is_empty()
    }
}
