//! # rosmaster
//!
//! `rosmaster` is the control plane of a publish/subscribe graph: a central
//! master that keeps track of who publishes and who subscribes each topic,
//! and the node-side logic that turns a match into a direct data stream
//! between a publisher and a subscriber. Everything travels over WebSockets.
//!
//! ## Core Modules
//!
//! - `identity`: Value types naming nodes, topics and publishers.
//! - `registry`: The master's in-memory topic table.
//! - `master`: The master RPC service, its server and its client.
//! - `node`: Nodes with their slave service, publishers, subscribers and connection negotiation.
//! - `transport`: Wire messages, the WebSocket RPC client and the endpoint accept loop.
//! - `config`: Loading settings from files and the environment.
//! - `utils`: Errors, logging and the count-down latch.

pub mod config;
pub mod identity;
pub mod master;
pub mod node;
pub mod registry;
pub mod transport;
pub mod utils;

#[cfg(test)]
mod tests;
