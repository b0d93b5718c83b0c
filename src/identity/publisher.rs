//! Publisher identifiers
//!
//! A `PublisherIdentifier` is the composite key naming one publishing
//! endpoint: the node that publishes and the topic it publishes. Either half
//! may be absent (for example when decoded from a peer that omitted it).
//! Two identifiers are equal only when both halves are equal, where two
//! absent halves compare equal and an absent half never equals a present one.
//! That is exactly the derived equality on `Option`, and the derived `Hash`
//! agrees with it.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use super::node::NodeIdentifier;
use super::topic::TopicDefinition;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublisherIdentifier {
    #[serde(default)]
    node: Option<NodeIdentifier>,
    #[serde(default)]
    topic: Option<TopicDefinition>,
}

impl PublisherIdentifier {
    pub fn new(node: NodeIdentifier, topic: TopicDefinition) -> Self {
        Self {
            node: Some(node),
            topic: Some(topic),
        }
    }

    /// Build an identifier where either half may be missing.
    pub fn from_parts(node: Option<NodeIdentifier>, topic: Option<TopicDefinition>) -> Self {
        Self { node, topic }
    }

    pub fn node(&self) -> Option<&NodeIdentifier> {
        self.node.as_ref()
    }

    pub fn topic(&self) -> Option<&TopicDefinition> {
        self.topic.as_ref()
    }

    pub fn node_name(&self) -> Option<&str> {
        self.node.as_ref().map(NodeIdentifier::name)
    }

    /// Slave service address of the publishing node.
    pub fn node_uri(&self) -> Option<&Url> {
        self.node.as_ref().map(NodeIdentifier::uri)
    }

    pub fn topic_name(&self) -> Option<&str> {
        self.topic.as_ref().map(TopicDefinition::name)
    }

    /// Both halves are present.
    pub fn is_complete(&self) -> bool {
        self.node.is_some() && self.topic.is_some()
    }
}

impl fmt::Display for PublisherIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PublisherIdentifier<")?;
        match &self.node {
            Some(node) => write!(f, "{node}")?,
            None => f.write_str("none")?,
        }
        f.write_str(", ")?;
        match &self.topic {
            Some(topic) => write!(f, "{topic}")?,
            None => f.write_str("none")?,
        }
        f.write_str(">")
    }
}
