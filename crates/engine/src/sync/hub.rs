//! In-memory transport joining one Authority to any number of Observers.

use std::collections::BTreeMap;

use protocol::{Intent, StateBroadcast};

use super::{link, AuthorityLink, LinkPort, ObserverLink, PeerEvent, PeerId};

/// Routes messages between links held in the same process.
///
/// Nothing moves until [`LocalHub::pump`] is called, which makes delivery
/// points explicit in tests.
#[derive(Debug)]
pub struct LocalHub {
    authority: LinkPort<PeerEvent, StateBroadcast>,
    observers: BTreeMap<PeerId, LinkPort<StateBroadcast, Intent>>,
    next_peer: PeerId,
}

impl LocalHub {
    /// Create a hub and the Authority's end of it.
    pub fn new() -> (Self, AuthorityLink) {
        let (authority_link, authority) = link();
        (
            Self {
                authority,
                observers: BTreeMap::new(),
                next_peer: 1,
            },
            authority_link,
        )
    }

    /// Attach a new Observer.
    pub fn connect(&mut self) -> (PeerId, ObserverLink) {
        let peer = self.next_peer;
        self.next_peer += 1;
        let (observer_link, port) = link();
        self.observers.insert(peer, port);
        let _ = self.authority.inbound.send(PeerEvent::Joined(peer));
        (peer, observer_link)
    }

    /// Detach an Observer.
    pub fn disconnect(&mut self, peer: PeerId) {
        if self.observers.remove(&peer).is_some() {
            let _ = self.authority.inbound.send(PeerEvent::Left(peer));
        }
    }

    /// Deliver everything queued in both directions. Returns messages moved.
    pub fn pump(&mut self) -> usize {
        let mut moved = 0;
        for (&peer, port) in &mut self.observers {
            while let Ok(intent) = port.outbound.try_recv() {
                let _ = self.authority.inbound.send(PeerEvent::Intent(peer, intent));
                moved += 1;
            }
        }
        while let Ok(state) = self.authority.outbound.try_recv() {
            for port in self.observers.values() {
                let _ = port.inbound.send(state.clone());
                moved += 1;
            }
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::Position;

    #[test]
    fn test_pump_routes_both_ways() {
        let (mut hub, mut authority) = LocalHub::new();
        let (a, mut obs_a) = hub.connect();
        let (_b, mut obs_b) = hub.connect();

        obs_a.send(Intent::Move {
            target: Position::new(1.0, 2.0),
        });
        authority.send(StateBroadcast {
            tick: 3,
            ..Default::default()
        });
        hub.pump();

        let events = authority.drain();
        assert_eq!(events[0], PeerEvent::Joined(a));
        assert_eq!(
            events.last(),
            Some(&PeerEvent::Intent(
                a,
                Intent::Move {
                    target: Position::new(1.0, 2.0)
                }
            ))
        );
        assert_eq!(obs_a.drain()[0].tick, 3);
        assert_eq!(obs_b.drain()[0].tick, 3);
    }

    #[test]
    fn test_disconnect_reports_left() {
        let (mut hub, mut authority) = LocalHub::new();
        let (a, mut obs) = hub.connect();
        hub.disconnect(a);
        assert_eq!(authority.drain(), vec![PeerEvent::Joined(a), PeerEvent::Left(a)]);

        authority.send(StateBroadcast::default());
        assert_eq!(hub.pump(), 0);
        assert!(obs.drain().is_empty());
    }
}
