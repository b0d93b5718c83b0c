//! The `utils` module provides the pieces shared by the master and the nodes:
//! error types, logging initialisation and the count-down latch used to signal
//! registration round trips.

pub mod error;
pub mod latch;
pub mod logging;

pub use error::{ConnectionError, NodeError, RpcError, ServerError};
pub use latch::CountDownLatch;

#[cfg(test)]
mod tests;
