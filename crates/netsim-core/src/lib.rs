#![warn(unreachable_pub, missing_debug_implementations)]

//! `netsim-core`: the authoritative in-memory network topology ([`graph::Network`]), the pure
//! traversal kernel built over it ([`traversal`]), and the simulation state that evolves as
//! simulated time advances ([`sim::Simulator`]).
//!
//! Everything outside this crate — the HTTP/JSON control surface, the WebSocket push transport,
//! SQL-backed persistence, auth — is an external collaborator that only ever calls the operations
//! exposed here and forwards the [`events::Event`]s this crate emits.

pub mod error;
pub mod events;
pub mod graph;
pub mod packet;
pub mod sim;
#[cfg(test)]
pub(crate) mod testing;
pub mod traversal;
pub mod units;

pub use error::GraphError;
pub use events::{ChannelSubscriber, Event, EventKind, InMemorySubscriber, Publisher, Subscriber, SubscriberId};
pub use graph::{LinkData, Network, NetworkConfig, NodeData, NodeKind};
pub use packet::{Fragmentation, Packet, TcpControl};
pub use sim::{Simulator, SimulatorConfig, TcpConnection, TcpState};
