//! The `transport` module is responsible for everything that crosses the
//! network: the request/response messages of the master and slave RPC
//! surfaces, the frames of a data stream, the WebSocket RPC client, and the
//! WebSocket accept loop every endpoint is built on.
//!
//! One RPC call is one WebSocket connection carrying a JSON request text
//! frame answered by a JSON response text frame. A data stream is a
//! WebSocket connection that starts with a `subscribe` handshake and then
//! carries one `message` frame per published message.

pub mod message;
pub mod rpc;
pub mod server;

pub use message::{DataFrame, MasterRequest, MasterResponse, Message, SlaveRequest, SlaveResponse};
pub use server::{Endpoint, EndpointHandle, RequestHandler, serve_rpc};

/// Name of the data stream protocol nodes offer and accept.
pub const WEBSOCKET_PROTOCOL: &str = "websocket";

#[cfg(test)]
mod tests;
