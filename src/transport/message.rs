//! Wire messages
//!
//! Every message is a JSON object tagged by its `"type"` field.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::identity::{NodeIdentifier, PublisherIdentifier, TopicDefinition};
use crate::registry::SystemState;

/// Calls served by the master.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MasterRequest {
    #[serde(rename = "register_publisher")]
    RegisterPublisher {
        node: NodeIdentifier,
        topic: TopicDefinition,
    },
    #[serde(rename = "unregister_publisher")]
    UnregisterPublisher { node: NodeIdentifier, topic: String },
    #[serde(rename = "register_subscriber")]
    RegisterSubscriber {
        node: NodeIdentifier,
        topic: TopicDefinition,
    },
    #[serde(rename = "unregister_subscriber")]
    UnregisterSubscriber { node: NodeIdentifier, topic: String },
    #[serde(rename = "lookup_publishers")]
    LookupPublishers { topic: String },
    #[serde(rename = "lookup_node")]
    LookupNode { name: String },
    #[serde(rename = "published_topics")]
    PublishedTopics,
    #[serde(rename = "system_state")]
    SystemState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MasterResponse {
    #[serde(rename = "ack")]
    Ack,
    #[serde(rename = "publishers")]
    Publishers { publishers: Vec<PublisherIdentifier> },
    #[serde(rename = "node")]
    Node { node: Option<NodeIdentifier> },
    #[serde(rename = "topics")]
    Topics { topics: Vec<TopicDefinition> },
    #[serde(rename = "system_state")]
    SystemState { state: SystemState },
    #[serde(rename = "error")]
    Error { message: String },
}

/// Calls served by every node's slave service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SlaveRequest {
    /// Pushed by the master: the full, current publisher list of `topic`.
    /// A higher `revision` is a newer list.
    #[serde(rename = "publisher_update")]
    PublisherUpdate {
        topic: String,
        #[serde(default)]
        revision: u64,
        publishers: Vec<PublisherIdentifier>,
    },
    /// Sent by a subscriber to a publishing node.
    #[serde(rename = "request_topic")]
    RequestTopic {
        topic: String,
        protocols: Vec<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SlaveResponse {
    #[serde(rename = "ack")]
    Ack,
    #[serde(rename = "topic_endpoint")]
    TopicEndpoint { protocol: String, endpoint: Url },
    #[serde(rename = "not_publishing")]
    NotPublishing { topic: String },
    #[serde(rename = "protocol_mismatch")]
    ProtocolMismatch { supported: Vec<String> },
    #[serde(rename = "error")]
    Error { message: String },
}

/// Frames exchanged on a data stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DataFrame {
    /// First frame sent by the subscriber.
    #[serde(rename = "subscribe")]
    Subscribe {
        topic: String,
        message_type: String,
        caller_id: String,
    },
    #[serde(rename = "accepted")]
    Accepted { topic: String, message_type: String },
    #[serde(rename = "rejected")]
    Rejected { reason: String },
    #[serde(rename = "message")]
    Message(Message),
}

/// A published message. The payload is opaque to the middleware.
///
/// - `timestamp`: milliseconds since UNIX epoch, set by the publisher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub topic: String,
    pub payload: String,
    pub timestamp: i64,
}

impl Message {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}
