//! Master registry service
//!
//! Answers the master RPC surface from the registry. Every change to a
//! topic's publisher set, including an idempotent re-registration, is pushed
//! to that topic's subscribers. Each subscriber is notified from its own
//! task with the configured timeout; a failed push is logged and affects
//! neither the caller nor the other subscribers.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::node::SlaveClient;
use crate::registry::{TopicRegistry, TopicSnapshot};
use crate::transport::{MasterRequest, MasterResponse, RequestHandler};

#[derive(Debug)]
pub struct MasterService {
    registry: Arc<TopicRegistry>,
    notify_timeout: Duration,
}

impl MasterService {
    pub fn new(registry: Arc<TopicRegistry>, notify_timeout: Duration) -> Self {
        Self {
            registry,
            notify_timeout,
        }
    }

    pub fn registry(&self) -> &Arc<TopicRegistry> {
        &self.registry
    }

    fn notify_subscribers(&self, snapshot: TopicSnapshot) {
        let TopicSnapshot {
            topic,
            revision,
            publishers,
            subscribers,
        } = snapshot;

        for subscriber in subscribers {
            let topic = topic.name().to_string();
            let publishers = publishers.clone();
            let slave = SlaveClient::new(subscriber.uri().clone(), self.notify_timeout);

            tokio::spawn(async move {
                match slave.publisher_update(&topic, revision, publishers).await {
                    Ok(()) => debug!("Sent publisher update for {} to {}", topic, subscriber.name()),
                    Err(e) => warn!(
                        "Publisher update for {} to {} failed: {}",
                        topic,
                        subscriber,
                        e
                    ),
                }
            });
        }
    }
}

impl RequestHandler for MasterService {
    type Request = MasterRequest;
    type Response = MasterResponse;

    async fn handle(&self, request: MasterRequest) -> MasterResponse {
        match request {
            MasterRequest::RegisterPublisher { node, topic } => {
                info!("{} publishes {}", node.name(), topic);
                let snapshot = self.registry.register_publisher(topic, node);
                self.notify_subscribers(snapshot);
                MasterResponse::Ack
            }
            MasterRequest::UnregisterPublisher { node, topic } => {
                if let Some(snapshot) = self.registry.unregister_publisher(&topic, &node) {
                    info!("{} no longer publishes {}", node.name(), topic);
                    self.notify_subscribers(snapshot);
                }
                MasterResponse::Ack
            }
            MasterRequest::RegisterSubscriber { node, topic } => {
                info!("{} subscribes {}", node.name(), topic);
                let publishers = self.registry.register_subscriber(topic, node);
                MasterResponse::Publishers { publishers }
            }
            MasterRequest::UnregisterSubscriber { node, topic } => {
                if self.registry.unregister_subscriber(&topic, &node) {
                    info!("{} no longer subscribes {}", node.name(), topic);
                }
                MasterResponse::Ack
            }
            MasterRequest::LookupPublishers { topic } => MasterResponse::Publishers {
                publishers: self.registry.lookup(&topic),
            },
            MasterRequest::LookupNode { name } => MasterResponse::Node {
                node: self.registry.lookup_node(&name),
            },
            MasterRequest::PublishedTopics => MasterResponse::Topics {
                topics: self.registry.published_topics(),
            },
            MasterRequest::SystemState => MasterResponse::SystemState {
                state: self.registry.system_state(),
            },
        }
    }

    fn malformed(&self, reason: String) -> MasterResponse {
        MasterResponse::Error { message: reason }
    }
}
