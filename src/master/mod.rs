//! The `master` module is the central authority of the graph.
//!
//! [`MasterServer`] serves the [`MasterService`] RPC surface on a WebSocket
//! endpoint. The service owns the [`TopicRegistry`](crate::registry::TopicRegistry)
//! and, whenever the publisher set of a topic changes, pushes the new list
//! to every subscriber of that topic. [`MasterClient`] is the typed client
//! nodes and the CLI use to talk to it.

pub mod client;
pub mod server;
pub mod service;

pub use client::MasterClient;
pub use server::MasterServer;
pub use service::MasterService;
