//! Topic registry
//!
//! The master's authoritative table of who publishes and who subscribes each
//! topic. Every operation takes the single table-wide lock for its whole
//! read-modify-write sequence, so concurrent registrations for the same topic
//! never interleave. No operation can fail: unknown topics read as empty and
//! removing something that is not registered is a no-op.
//!
//! Entries are keyed by topic name. A publisher registration sets the entry's
//! `TopicDefinition`; subscribers only seed it when the entry is new.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::identity::{NodeIdentifier, PublisherIdentifier, TopicDefinition};
use crate::registry::entry::TopicRegistryEntry;

/// Publisher and subscriber sets of one topic, captured under the lock.
///
/// `revision` grows with every publisher change of any topic, so of two
/// snapshots of the same topic the higher revision is the newer one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSnapshot {
    pub topic: TopicDefinition,
    pub revision: u64,
    pub publishers: Vec<PublisherIdentifier>,
    pub subscribers: Vec<NodeIdentifier>,
}

impl TopicSnapshot {
    fn of(entry: &TopicRegistryEntry, revision: u64) -> Self {
        Self {
            topic: entry.topic.clone(),
            revision,
            publishers: entry.publisher_identifiers(),
            subscribers: entry.subscriber_nodes(),
        }
    }
}

/// Node names attached to one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicMembers {
    pub topic: String,
    pub nodes: Vec<String>,
}

/// Publishers and subscribers of every registered topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemState {
    pub publishers: Vec<TopicMembers>,
    pub subscribers: Vec<TopicMembers>,
}

#[derive(Debug, Default)]
pub struct TopicRegistry {
    entries: Mutex<HashMap<String, TopicRegistryEntry>>,
    /// Only advanced while `entries` is locked.
    revision: AtomicU64,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_revision(&self) -> u64 {
        self.revision.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, TopicRegistryEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds `node` to the publishers of `topic`. The returned snapshot names
    /// the subscribers that must be told about the new publisher list.
    pub fn register_publisher(&self, topic: TopicDefinition, node: NodeIdentifier) -> TopicSnapshot {
        let mut entries = self.entries();
        let entry = entries
            .entry(topic.name().to_string())
            .or_insert_with(|| TopicRegistryEntry::new(topic.clone()));

        if entry.topic != topic {
            debug!(
                "Topic {} now advertised as {} (was {})",
                topic.name(),
                topic.message_type(),
                entry.topic.message_type()
            );
            entry.topic = topic;
        }

        if entry.add_publisher(node.clone()) {
            debug!("Registered publisher {} for {}", node.name(), entry.topic.name());
        }

        TopicSnapshot::of(entry, self.next_revision())
    }

    /// Removes `node` from the publishers of `topic`. Returns a snapshot only
    /// when the publisher set actually changed.
    pub fn unregister_publisher(&self, topic: &str, node: &NodeIdentifier) -> Option<TopicSnapshot> {
        let mut entries = self.entries();
        let entry = entries.get_mut(topic)?;
        if !entry.remove_publisher(node) {
            return None;
        }
        debug!("Unregistered publisher {} from {}", node.name(), topic);

        let snapshot = TopicSnapshot::of(entry, self.next_revision());
        if entry.is_empty() {
            entries.remove(topic);
        }
        Some(snapshot)
    }

    /// Adds `node` to the subscribers of `topic` and returns the publishers
    /// it should connect to right away.
    pub fn register_subscriber(
        &self,
        topic: TopicDefinition,
        node: NodeIdentifier,
    ) -> Vec<PublisherIdentifier> {
        let mut entries = self.entries();
        let entry = entries
            .entry(topic.name().to_string())
            .or_insert_with(|| TopicRegistryEntry::new(topic));

        if entry.add_subscriber(node.clone()) {
            debug!("Registered subscriber {} for {}", node.name(), entry.topic.name());
        }

        entry.publisher_identifiers()
    }

    /// Returns `true` if `node` was subscribed.
    pub fn unregister_subscriber(&self, topic: &str, node: &NodeIdentifier) -> bool {
        let mut entries = self.entries();
        let Some(entry) = entries.get_mut(topic) else {
            return false;
        };
        if !entry.remove_subscriber(node) {
            return false;
        }
        debug!("Unregistered subscriber {} from {}", node.name(), topic);

        if entry.is_empty() {
            entries.remove(topic);
        }
        true
    }

    pub fn lookup(&self, topic: &str) -> Vec<PublisherIdentifier> {
        self.entries()
            .get(topic)
            .map(TopicRegistryEntry::publisher_identifiers)
            .unwrap_or_default()
    }

    pub fn subscribers(&self, topic: &str) -> Vec<NodeIdentifier> {
        self.entries()
            .get(topic)
            .map(TopicRegistryEntry::subscriber_nodes)
            .unwrap_or_default()
    }

    /// Topics with at least one publisher.
    pub fn published_topics(&self) -> Vec<TopicDefinition> {
        let mut topics: Vec<_> = self
            .entries()
            .values()
            .filter(|entry| !entry.publishers.is_empty())
            .map(|entry| entry.topic.clone())
            .collect();
        topics.sort();
        topics
    }

    pub fn system_state(&self) -> SystemState {
        let entries = self.entries();
        let mut state = SystemState::default();

        for (name, entry) in entries.iter() {
            if !entry.publishers.is_empty() {
                state.publishers.push(members(name, entry.publishers.iter()));
            }
            if !entry.subscribers.is_empty() {
                state.subscribers.push(members(name, entry.subscribers.iter()));
            }
        }

        state.publishers.sort_by(|a, b| a.topic.cmp(&b.topic));
        state.subscribers.sort_by(|a, b| a.topic.cmp(&b.topic));
        state
    }

    /// Finds a registered node by name, whichever role it plays.
    pub fn lookup_node(&self, name: &str) -> Option<NodeIdentifier> {
        self.entries()
            .values()
            .flat_map(|entry| entry.publishers.iter().chain(entry.subscribers.iter()))
            .find(|node| node.name() == name)
            .cloned()
    }

    pub fn topic_count(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

fn members<'a>(topic: &str, nodes: impl Iterator<Item = &'a NodeIdentifier>) -> TopicMembers {
    let mut nodes: Vec<String> = nodes.map(|node| node.name().to_string()).collect();
    nodes.sort();
    nodes.dedup();
    TopicMembers {
        topic: topic.to_string(),
        nodes,
    }
}
