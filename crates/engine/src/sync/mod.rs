//! Sync plumbing between the Authority and its Observers.
//!
//! Every role talks through a [`PeerLink`]: an unbounded inbound queue that
//! is drained once at the start of each tick, and a non-blocking outbound
//! sender whose failures mean "peer unreachable" and are ignored.

mod authority;
mod hub;
mod mirror;

pub use authority::AuthorityState;
pub use hub::LocalHub;
pub use mirror::{MirrorUpdate, ObserverMirror};

use protocol::{Intent, StateBroadcast};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

/// Transport-assigned id of a connected Observer.
pub type PeerId = u32;

/// What the transport hands the Authority.
#[derive(Debug, Clone, PartialEq)]
pub enum PeerEvent {
    Joined(PeerId),
    Intent(PeerId, Intent),
    Left(PeerId),
}

/// One side of a message channel.
#[derive(Debug)]
pub struct PeerLink<In, Out> {
    inbound: UnboundedReceiver<In>,
    outbound: UnboundedSender<Out>,
}

/// The Authority's link: peer events in, broadcasts out (fanned out by the transport).
pub type AuthorityLink = PeerLink<PeerEvent, StateBroadcast>;
/// An Observer's link: broadcasts in, intents out.
pub type ObserverLink = PeerLink<StateBroadcast, Intent>;

impl<In, Out> PeerLink<In, Out> {
    pub fn new(inbound: UnboundedReceiver<In>, outbound: UnboundedSender<Out>) -> Self {
        Self { inbound, outbound }
    }

    /// Take everything queued so far, in arrival order.
    pub fn drain(&mut self) -> Vec<In> {
        let mut out = Vec::new();
        loop {
            match self.inbound.try_recv() {
                Ok(msg) => out.push(msg),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        out
    }

    /// Non-blocking send. Returns false when the other side is gone.
    #[inline]
    pub fn send(&self, msg: Out) -> bool {
        self.outbound.send(msg).is_ok()
    }

    /// Drop everything still queued.
    pub fn discard(&mut self) -> usize {
        self.drain().len()
    }
}

/// The transport's view of a link: feed inbound, consume outbound.
#[derive(Debug)]
pub struct LinkPort<In, Out> {
    pub inbound: UnboundedSender<In>,
    pub outbound: UnboundedReceiver<Out>,
}

/// Create a link and the port a transport drives it through.
pub fn link<In, Out>() -> (PeerLink<In, Out>, LinkPort<In, Out>) {
    let (in_tx, in_rx) = mpsc::unbounded_channel();
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    (
        PeerLink::new(in_rx, out_tx),
        LinkPort {
            inbound: in_tx,
            outbound: out_rx,
        },
    )
}
