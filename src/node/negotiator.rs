//! Connection negotiation
//!
//! Attaching a subscriber to one publisher takes two steps. First the
//! publisher's slave service is asked, with the protocols the subscriber
//! speaks, where the data stream of the topic lives. Then that endpoint is
//! opened and the subscribe handshake is performed. Any failure is reported
//! as a [`ConnectionError`] for this publisher only.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;
use tungstenite::protocol::Message as WsMessage;
use url::Url;

use crate::identity::{PublisherIdentifier, TopicDefinition};
use crate::node::slave::SlaveClient;
use crate::transport::{DataFrame, SlaveResponse};
use crate::utils::{ConnectionError, RpcError};

pub type DataStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// An accepted data stream from one publisher.
#[derive(Debug)]
pub struct DataConnection {
    publisher: PublisherIdentifier,
    protocol: String,
    endpoint: Url,
    stream: DataStream,
}

impl DataConnection {
    pub fn publisher(&self) -> &PublisherIdentifier {
        &self.publisher
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn into_stream(self) -> DataStream {
        self.stream
    }
}

/// Subscriber-side handshake for one subscription.
#[derive(Debug, Clone)]
pub struct ConnectionNegotiator {
    caller_id: String,
    topic: TopicDefinition,
    protocols: Vec<String>,
    timeout: Duration,
}

impl ConnectionNegotiator {
    /// `protocols` are offered in order of preference; `timeout` bounds each
    /// of the two steps.
    pub fn new(
        caller_id: impl Into<String>,
        topic: TopicDefinition,
        protocols: Vec<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            caller_id: caller_id.into(),
            topic,
            protocols,
            timeout,
        }
    }

    pub fn protocols(&self) -> &[String] {
        &self.protocols
    }

    pub async fn connect(&self, publisher: &PublisherIdentifier) -> Result<DataConnection, ConnectionError> {
        let (Some(node), Some(topic)) = (publisher.node(), publisher.topic()) else {
            return Err(ConnectionError::StaleReference {
                publisher: publisher.to_string(),
                reason: "incomplete identifier".to_string(),
            });
        };

        if topic.name() != self.topic.name() {
            return Err(ConnectionError::StaleReference {
                publisher: publisher.to_string(),
                reason: format!("publishes {}, not {}", topic.name(), self.topic.name()),
            });
        }

        let slave = SlaveClient::new(node.uri().clone(), self.timeout);
        let unreachable_peer = |source: RpcError| ConnectionError::UnreachablePeer {
            uri: node.uri().to_string(),
            source,
        };

        let response = slave
            .request_topic(topic.name(), &self.protocols)
            .await
            .map_err(unreachable_peer)?;

        let (protocol, endpoint) = match response {
            SlaveResponse::TopicEndpoint { protocol, endpoint } => (protocol, endpoint),
            SlaveResponse::NotPublishing { topic } => {
                return Err(ConnectionError::StaleReference {
                    publisher: publisher.to_string(),
                    reason: format!("{} does not publish {}", node.name(), topic),
                });
            }
            SlaveResponse::ProtocolMismatch { .. } => {
                return Err(self.protocol_mismatch(publisher));
            }
            SlaveResponse::Error { message } => return Err(unreachable_peer(RpcError::Remote(message))),
            other => {
                return Err(unreachable_peer(RpcError::UnexpectedResponse(format!("{other:?}"))));
            }
        };

        if !self.protocols.contains(&protocol) {
            return Err(self.protocol_mismatch(publisher));
        }

        debug!("Opening {} stream {} for {}", protocol, endpoint, publisher);
        let handshake = match tokio::time::timeout(self.timeout, self.subscribe(&endpoint)).await {
            Ok(result) => result,
            Err(_) => Err(RpcError::Timeout(self.timeout)),
        };
        let (stream, reply) = handshake.map_err(|source| ConnectionError::UnreachablePeer {
            uri: endpoint.to_string(),
            source,
        })?;

        match reply {
            DataFrame::Accepted { .. } => Ok(DataConnection {
                publisher: publisher.clone(),
                protocol,
                endpoint,
                stream,
            }),
            DataFrame::Rejected { reason } => Err(ConnectionError::StaleReference {
                publisher: publisher.to_string(),
                reason,
            }),
            other => Err(ConnectionError::UnreachablePeer {
                uri: endpoint.to_string(),
                source: RpcError::UnexpectedResponse(format!("{other:?}")),
            }),
        }
    }

    fn protocol_mismatch(&self, publisher: &PublisherIdentifier) -> ConnectionError {
        ConnectionError::ProtocolMismatch {
            publisher: publisher.to_string(),
            offered: self.protocols.clone(),
        }
    }

    /// Sends the subscribe frame and waits for the publisher's verdict.
    async fn subscribe(&self, endpoint: &Url) -> Result<(DataStream, DataFrame), RpcError> {
        let (mut stream, _) = connect_async(endpoint.as_str()).await?;

        let request = DataFrame::Subscribe {
            topic: self.topic.name().to_string(),
            message_type: self.topic.message_type().to_string(),
            caller_id: self.caller_id.clone(),
        };
        stream
            .send(WsMessage::text(serde_json::to_string(&request)?))
            .await?;

        while let Some(msg) = stream.next().await {
            let msg = msg?;
            if msg.is_text() {
                let reply: DataFrame = serde_json::from_str(msg.to_text()?)?;
                return Ok((stream, reply));
            }
            if msg.is_close() {
                break;
            }
        }

        Err(RpcError::Closed)
    }
}
