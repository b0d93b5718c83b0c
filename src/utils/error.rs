//! Error types used across the master and the nodes.
//!
//! Registry mutations never fail, so there is no registry error. Failures are
//! confined to the network paths: RPC calls ([`RpcError`]), binding endpoints
//! ([`ServerError`]), negotiating a data connection with one publisher
//! ([`ConnectionError`]) and node bootstrap ([`NodeError`]).

use std::time::Duration;

use thiserror::Error;

/// Failure of a single request/response call against a remote endpoint.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("websocket error: {0}")]
    Transport(#[from] tungstenite::Error),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection closed before a response arrived")]
    Closed,

    #[error("remote error: {0}")]
    Remote(String),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Failure to bind or run a WebSocket endpoint.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid advertised uri: {0}")]
    InvalidUri(#[from] url::ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure to attach a subscriber to one publisher.
///
/// A `ConnectionError` only concerns the publisher/subscriber pair it was
/// raised for; the subscription itself stays usable.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The publisher's node no longer recognises the identifier.
    #[error("stale publisher {publisher}: {reason}")]
    StaleReference { publisher: String, reason: String },

    /// The publisher's slave service or data endpoint could not be reached.
    #[error("unreachable peer {uri}: {source}")]
    UnreachablePeer {
        uri: String,
        #[source]
        source: RpcError,
    },

    /// None of the offered protocols is supported by the publisher.
    #[error("no common protocol with {publisher}, offered {offered:?}")]
    ProtocolMismatch {
        publisher: String,
        offered: Vec<String>,
    },
}

/// Failure while bootstrapping or driving a node.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Server(#[from] ServerError),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("invalid master uri {uri}: {source}")]
    InvalidMasterUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    #[error("topic {topic} is already in use with type {existing}, requested {requested}")]
    TopicTypeMismatch {
        topic: String,
        existing: String,
        requested: String,
    },

    #[error("node {0} has been shut down")]
    ShutDown(String),
}
