//! Node-local slave service
//!
//! The RPC surface every node serves. The master pushes `publisher_update`
//! here; subscribers of other nodes call `request_topic` to learn where to
//! open the data stream of a topic this node publishes.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::identity::PublisherIdentifier;
use crate::node::local::LocalTopics;
use crate::transport::rpc;
use crate::transport::{RequestHandler, SlaveRequest, SlaveResponse, WEBSOCKET_PROTOCOL};
use crate::utils::RpcError;

pub struct SlaveService {
    topics: Arc<LocalTopics>,
    data_uri: Url,
}

impl SlaveService {
    pub(crate) fn new(topics: Arc<LocalTopics>, data_uri: Url) -> Self {
        Self { topics, data_uri }
    }
}

impl RequestHandler for SlaveService {
    type Request = SlaveRequest;
    type Response = SlaveResponse;

    async fn handle(&self, request: SlaveRequest) -> SlaveResponse {
        match request {
            SlaveRequest::PublisherUpdate {
                topic,
                revision,
                publishers,
            } => {
                match self.topics.subscriber(&topic) {
                    Some(subscriber) => {
                        debug!("{} publishers for {} (revision {})", publishers.len(), topic, revision);
                        tokio::spawn(async move {
                            subscriber.apply_update(revision, publishers).await;
                        });
                    }
                    None => debug!("Ignoring publisher update for {}: not subscribed", topic),
                }
                SlaveResponse::Ack
            }
            SlaveRequest::RequestTopic { topic, protocols } => {
                if self.topics.publisher(&topic).is_none() {
                    return SlaveResponse::NotPublishing { topic };
                }
                if !protocols.iter().any(|p| p == WEBSOCKET_PROTOCOL) {
                    return SlaveResponse::ProtocolMismatch {
                        supported: vec![WEBSOCKET_PROTOCOL.to_string()],
                    };
                }
                SlaveResponse::TopicEndpoint {
                    protocol: WEBSOCKET_PROTOCOL.to_string(),
                    endpoint: self.data_uri.clone(),
                }
            }
        }
    }

    fn malformed(&self, reason: String) -> SlaveResponse {
        SlaveResponse::Error { message: reason }
    }
}

/// Typed calls against a node's slave service.
#[derive(Debug, Clone)]
pub struct SlaveClient {
    uri: Url,
    timeout: Duration,
}

impl SlaveClient {
    pub fn new(uri: Url, timeout: Duration) -> Self {
        Self { uri, timeout }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub async fn publisher_update(
        &self,
        topic: &str,
        revision: u64,
        publishers: Vec<PublisherIdentifier>,
    ) -> Result<(), RpcError> {
        let request = SlaveRequest::PublisherUpdate {
            topic: topic.to_string(),
            revision,
            publishers,
        };
        match rpc::call(&self.uri, &request, self.timeout).await? {
            SlaveResponse::Ack => Ok(()),
            SlaveResponse::Error { message } => Err(RpcError::Remote(message)),
            other => Err(RpcError::UnexpectedResponse(format!("{other:?}"))),
        }
    }

    /// The raw answer is returned; turning it into a connection outcome is
    /// up to the caller.
    pub async fn request_topic(&self, topic: &str, protocols: &[String]) -> Result<SlaveResponse, RpcError> {
        let request = SlaveRequest::RequestTopic {
            topic: topic.to_string(),
            protocols: protocols.to_vec(),
        };
        rpc::call(&self.uri, &request, self.timeout).await
    }
}
