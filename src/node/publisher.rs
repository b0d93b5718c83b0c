//! Publishers and the data endpoint
//!
//! A [`Publisher`] keeps one outbound link per attached subscriber. Each link
//! is an unbounded channel drained into the WebSocket sink by a forwarding
//! task, so `publish` never waits on the network.
//!
//! The node's data endpoint serves every publisher of the node. A connecting
//! subscriber opens with a `subscribe` frame naming the topic and its
//! message type and is answered with `accepted` or `rejected`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, error, info, warn};
use tungstenite::protocol::Message as WsMessage;
use uuid::Uuid;

use crate::identity::{NodeIdentifier, PublisherIdentifier, TopicDefinition};
use crate::master::MasterClient;
use crate::node::local::LocalTopics;
use crate::transport::{DataFrame, Endpoint, EndpointHandle, Message};
use crate::utils::CountDownLatch;

/// Message type accepted by either side of a handshake as matching anything.
pub const ANY_TYPE: &str = "*";

/// One attached subscriber.
#[derive(Debug)]
struct DataLink {
    caller_id: String,
    sender: UnboundedSender<WsMessage>,
}

#[derive(Clone)]
pub struct Publisher {
    inner: Arc<PublisherInner>,
}

struct PublisherInner {
    node: NodeIdentifier,
    topic: TopicDefinition,
    master: MasterClient,
    links: Mutex<HashMap<Uuid, DataLink>>,
    registered: CountDownLatch,
    topics: Weak<LocalTopics>,
}

impl Publisher {
    pub(crate) fn new(
        node: NodeIdentifier,
        topic: TopicDefinition,
        master: MasterClient,
        topics: Weak<LocalTopics>,
    ) -> Self {
        Self {
            inner: Arc::new(PublisherInner {
                node,
                topic,
                master,
                links: Mutex::new(HashMap::new()),
                registered: CountDownLatch::new(1),
                topics,
            }),
        }
    }

    /// Register with the master in the background.
    pub(crate) fn start_registration(&self) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            match inner.master.register_publisher(&inner.node, &inner.topic).await {
                Ok(()) => {
                    info!("{} registered as publisher of {}", inner.node.name(), inner.topic);
                    inner.registered.count_down();
                }
                Err(e) => warn!(
                    "{} failed to register as publisher of {}: {}",
                    inner.node.name(),
                    inner.topic.name(),
                    e
                ),
            }
        });
    }

    pub fn topic(&self) -> &TopicDefinition {
        &self.inner.topic
    }

    pub fn identifier(&self) -> PublisherIdentifier {
        PublisherIdentifier::new(self.inner.node.clone(), self.inner.topic.clone())
    }

    /// Wait until the master acknowledged the registration. Returns `false`
    /// if that did not happen within `timeout`.
    pub async fn await_registration(&self, timeout: Duration) -> bool {
        self.inner.registered.await_timeout(timeout).await
    }

    pub fn is_registered(&self) -> bool {
        self.inner.registered.count() == 0
    }

    /// Send `payload` to every attached subscriber. Returns how many links
    /// took the message; closed links are dropped on the way.
    pub fn publish(&self, payload: impl Into<String>) -> usize {
        let frame = DataFrame::Message(Message::new(self.inner.topic.name(), payload));
        let text = match serde_json::to_string(&frame) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize message for {}: {}", self.inner.topic.name(), e);
                return 0;
            }
        };
        let ws_msg = WsMessage::text(text);

        let mut links = self.inner.links();
        links.retain(|id, link| match link.sender.send(ws_msg.clone()) {
            Ok(()) => true,
            Err(e) => {
                debug!("Dropping link {} ({}): {}", id, link.caller_id, e);
                false
            }
        });
        links.len()
    }

    pub fn number_of_subscribers(&self) -> usize {
        let mut links = self.inner.links();
        links.retain(|_, link| !link.sender.is_closed());
        links.len()
    }

    /// Close every link, leave the node and unregister from the master.
    pub async fn shutdown(&self) {
        let inner = &self.inner;
        if let Some(topics) = inner.topics.upgrade() {
            let mut publishers = topics.publishers();
            if publishers
                .get(inner.topic.name())
                .is_some_and(|p| Arc::ptr_eq(&p.inner, inner))
            {
                publishers.remove(inner.topic.name());
            }
        }

        for (_, link) in inner.links().drain() {
            let _ = link.sender.send(WsMessage::Close(None));
        }

        if let Err(e) = inner
            .master
            .unregister_publisher(&inner.node, inner.topic.name())
            .await
        {
            warn!(
                "{} failed to unregister publisher of {}: {}",
                inner.node.name(),
                inner.topic.name(),
                e
            );
        }
    }

    fn attach(&self, caller_id: String, sender: UnboundedSender<WsMessage>) -> Uuid {
        let id = Uuid::new_v4();
        self.inner.links().insert(id, DataLink { caller_id, sender });
        id
    }

    fn detach(&self, id: &Uuid) {
        self.inner.links().remove(id);
    }
}

impl PublisherInner {
    fn links(&self) -> MutexGuard<'_, HashMap<Uuid, DataLink>> {
        self.links.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub(crate) fn types_match(published: &str, requested: &str) -> bool {
    published == requested || published == ANY_TYPE || requested == ANY_TYPE
}

/// Serve the data streams of every publisher in `topics` on `endpoint`.
pub(crate) fn serve_data(endpoint: Endpoint, topics: Arc<LocalTopics>) -> EndpointHandle {
    endpoint.serve(move |ws_stream, peer| {
        let topics = topics.clone();
        async move { accept_subscriber(ws_stream, peer, topics).await }
    })
}

type DataSink = SplitSink<WebSocketStream<TcpStream>, WsMessage>;

async fn accept_subscriber(ws_stream: WebSocketStream<TcpStream>, peer: SocketAddr, topics: Arc<LocalTopics>) {
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let Some(Ok(first)) = ws_receiver.next().await else {
        debug!("{peer} left before subscribing");
        return;
    };
    let request = first
        .to_text()
        .ok()
        .and_then(|text| serde_json::from_str::<DataFrame>(text).ok());

    let Some(DataFrame::Subscribe {
        topic,
        message_type,
        caller_id,
    }) = request
    else {
        reject(&mut ws_sender, peer, "expected a subscribe frame".to_string()).await;
        return;
    };

    let Some(publisher) = topics.publisher(&topic) else {
        reject(&mut ws_sender, peer, format!("not publishing {topic}")).await;
        return;
    };

    let published_type = publisher.topic().message_type().to_string();
    if !types_match(&published_type, &message_type) {
        let reason = format!("{topic} is {published_type}, not {message_type}");
        reject(&mut ws_sender, peer, reason).await;
        return;
    }

    // Create channel for this subscriber
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();

    let accepted = DataFrame::Accepted {
        topic: topic.clone(),
        message_type: published_type,
    };
    match serde_json::to_string(&accepted) {
        Ok(json) => {
            let _ = tx.send(WsMessage::text(json));
        }
        Err(e) => {
            error!("Failed to serialize handshake for {peer}: {e}");
            return;
        }
    }

    // Attach before the forwarding task starts so nothing published after
    // the handshake is missed.
    let link_id = publisher.attach(caller_id.clone(), tx);
    info!("{} subscribed to {} from {}", caller_id, topic, peer);

    // Forward messages from the publisher to the subscriber
    let forward_id = caller_id.clone();
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = ws_sender.send(msg).await {
                warn!("Failed to send message to {}: {}", forward_id, e);
                break;
            }
        }
        debug!("Send loop closed for {}", forward_id);
    });

    // Subscribers never send after the handshake; reading only notices the close.
    while let Some(Ok(msg)) = ws_receiver.next().await {
        if msg.is_close() {
            break;
        }
    }

    publisher.detach(&link_id);
    debug!("{} disconnected from {}", caller_id, topic);
}

async fn reject(ws_sender: &mut DataSink, peer: SocketAddr, reason: String) {
    warn!("Rejecting subscriber {peer}: {reason}");
    let frame = DataFrame::Rejected { reason };
    if let Ok(json) = serde_json::to_string(&frame) {
        let _ = ws_sender.send(WsMessage::text(json)).await;
    }
    let _ = ws_sender.close().await;
}
