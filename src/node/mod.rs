//! The `node` module is everything a participant of the graph runs.
//!
//! A [`Node`] owns two endpoints: the slave service, which the master pushes
//! publisher updates to and which subscribers ask for data endpoints, and
//! the data endpoint, which streams messages to connected subscribers. Its
//! [`Publisher`]s and [`Subscriber`]s register with the master in the
//! background; [`ConnectionNegotiator`] attaches a subscriber to one remote
//! publisher.

mod local;
pub mod negotiator;
#[allow(clippy::module_inception)]
pub mod node;
pub mod publisher;
pub mod slave;
pub mod subscriber;

pub use negotiator::{ConnectionNegotiator, DataConnection, DataStream};
pub use node::Node;
pub use publisher::{ANY_TYPE, Publisher};
pub use slave::{SlaveClient, SlaveService};
pub use subscriber::{MessageListener, Subscriber};
