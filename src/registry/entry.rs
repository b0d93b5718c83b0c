//! Registry entries
//!
//! A `TopicRegistryEntry` holds the publishing and subscribing nodes of one
//! topic. Duplicate adds are no-ops and removing a non-member does nothing.
//!
//! Concurrency note: entries are only reachable through the registry lock.

use std::collections::HashSet;

use crate::identity::{NodeIdentifier, PublisherIdentifier, TopicDefinition};

#[derive(Debug, Clone)]
pub struct TopicRegistryEntry {
    pub topic: TopicDefinition,
    pub publishers: HashSet<NodeIdentifier>,
    pub subscribers: HashSet<NodeIdentifier>,
}

impl TopicRegistryEntry {
    pub fn new(topic: TopicDefinition) -> Self {
        Self {
            topic,
            publishers: HashSet::new(),
            subscribers: HashSet::new(),
        }
    }

    /// Returns `true` if the node was not yet a publisher.
    pub fn add_publisher(&mut self, node: NodeIdentifier) -> bool {
        self.publishers.insert(node)
    }

    pub fn remove_publisher(&mut self, node: &NodeIdentifier) -> bool {
        self.publishers.remove(node)
    }

    /// Returns `true` if the node was not yet a subscriber.
    pub fn add_subscriber(&mut self, node: NodeIdentifier) -> bool {
        self.subscribers.insert(node)
    }

    pub fn remove_subscriber(&mut self, node: &NodeIdentifier) -> bool {
        self.subscribers.remove(node)
    }

    /// Neither publishers nor subscribers remain.
    pub fn is_empty(&self) -> bool {
        self.publishers.is_empty() && self.subscribers.is_empty()
    }

    /// Current publishers as identifiers carrying this entry's topic, sorted.
    pub fn publisher_identifiers(&self) -> Vec<PublisherIdentifier> {
        let mut publishers: Vec<_> = self
            .publishers
            .iter()
            .map(|node| PublisherIdentifier::new(node.clone(), self.topic.clone()))
            .collect();
        publishers.sort();
        publishers
    }

    pub fn subscriber_nodes(&self) -> Vec<NodeIdentifier> {
        let mut subscribers: Vec<_> = self.subscribers.iter().cloned().collect();
        subscribers.sort();
        subscribers
    }
}
