//! Websocket transport for the sync links.
//!
//! The session never sees sockets: the transport feeds a link's inbound
//! queue and consumes its outbound queue through a [`LinkPort`](crate::sync::LinkPort).

mod host;
mod join;

pub use host::HostTransport;
pub use join::JoinTransport;
