use std::time::Duration;

use url::Url;

use crate::identity::{NodeIdentifier, PublisherIdentifier, TopicDefinition};
use crate::registry::SystemState;
use crate::transport::rpc;
use crate::transport::{MasterRequest, MasterResponse};
use crate::utils::RpcError;

/// Typed calls against a master.
///
/// Every call is a separate RPC bounded by `timeout`. An `error` response
/// from the master surfaces as [`RpcError::Remote`].
#[derive(Debug, Clone)]
pub struct MasterClient {
    uri: Url,
    timeout: Duration,
}

impl MasterClient {
    pub fn new(uri: Url, timeout: Duration) -> Self {
        Self { uri, timeout }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub async fn register_publisher(
        &self,
        node: &NodeIdentifier,
        topic: &TopicDefinition,
    ) -> Result<(), RpcError> {
        let request = MasterRequest::RegisterPublisher {
            node: node.clone(),
            topic: topic.clone(),
        };
        match self.call(request).await? {
            MasterResponse::Ack => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    pub async fn unregister_publisher(&self, node: &NodeIdentifier, topic: &str) -> Result<(), RpcError> {
        let request = MasterRequest::UnregisterPublisher {
            node: node.clone(),
            topic: topic.to_string(),
        };
        match self.call(request).await? {
            MasterResponse::Ack => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Returns the publishers of `topic` known at registration time.
    pub async fn register_subscriber(
        &self,
        node: &NodeIdentifier,
        topic: &TopicDefinition,
    ) -> Result<Vec<PublisherIdentifier>, RpcError> {
        let request = MasterRequest::RegisterSubscriber {
            node: node.clone(),
            topic: topic.clone(),
        };
        match self.call(request).await? {
            MasterResponse::Publishers { publishers } => Ok(publishers),
            other => Err(unexpected(other)),
        }
    }

    pub async fn unregister_subscriber(&self, node: &NodeIdentifier, topic: &str) -> Result<(), RpcError> {
        let request = MasterRequest::UnregisterSubscriber {
            node: node.clone(),
            topic: topic.to_string(),
        };
        match self.call(request).await? {
            MasterResponse::Ack => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    pub async fn lookup_publishers(&self, topic: &str) -> Result<Vec<PublisherIdentifier>, RpcError> {
        let request = MasterRequest::LookupPublishers {
            topic: topic.to_string(),
        };
        match self.call(request).await? {
            MasterResponse::Publishers { publishers } => Ok(publishers),
            other => Err(unexpected(other)),
        }
    }

    pub async fn lookup_node(&self, name: &str) -> Result<Option<NodeIdentifier>, RpcError> {
        let request = MasterRequest::LookupNode {
            name: name.to_string(),
        };
        match self.call(request).await? {
            MasterResponse::Node { node } => Ok(node),
            other => Err(unexpected(other)),
        }
    }

    pub async fn published_topics(&self) -> Result<Vec<TopicDefinition>, RpcError> {
        match self.call(MasterRequest::PublishedTopics).await? {
            MasterResponse::Topics { topics } => Ok(topics),
            other => Err(unexpected(other)),
        }
    }

    pub async fn system_state(&self) -> Result<SystemState, RpcError> {
        match self.call(MasterRequest::SystemState).await? {
            MasterResponse::SystemState { state } => Ok(state),
            other => Err(unexpected(other)),
        }
    }

    async fn call(&self, request: MasterRequest) -> Result<MasterResponse, RpcError> {
        match rpc::call(&self.uri, &request, self.timeout).await? {
            MasterResponse::Error { message } => Err(RpcError::Remote(message)),
            response => Ok(response),
        }
    }
}

fn unexpected(response: MasterResponse) -> RpcError {
    RpcError::UnexpectedResponse(format!("{response:?}"))
}
