//! Authority side: accept observers and fan broadcasts out to all of them.

use std::net::SocketAddr;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use protocol::{Intent, StateBroadcast};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::{broadcast, watch};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::sync::{LinkPort, PeerEvent, PeerId};

/// Encoded broadcasts buffered per observer before it starts lagging.
const FANOUT_CAPACITY: usize = 16;

/// Drives an [`AuthorityLink`](crate::sync::AuthorityLink) over websockets.
#[derive(Debug)]
pub struct HostTransport {
    port: LinkPort<PeerEvent, StateBroadcast>,
}

impl HostTransport {
    pub fn new(port: LinkPort<PeerEvent, StateBroadcast>) -> Self {
        Self { port }
    }

    /// Accept observers until `shutdown` turns true. Each StateBroadcast is
    /// encoded once and shared by every connection.
    pub async fn serve(self, listener: TcpListener, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let LinkPort { inbound, mut outbound } = self.port;
        let (frames_tx, _) = broadcast::channel::<Bytes>(FANOUT_CAPACITY);

        let fanout_tx = frames_tx.clone();
        let fanout = tokio::spawn(async move {
            while let Some(state) = outbound.recv().await {
                match state.encode() {
                    // No subscribers is fine
                    Ok(frame) => {
                        let _ = fanout_tx.send(frame);
                    }
                    Err(e) => warn!("Dropping broadcast for tick {}: {}", state.tick, e),
                }
            }
        });

        info!("Accepting observers on {}", listener.local_addr()?);
        let mut next_peer: PeerId = 1;
        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                accepted = listener.accept() => {
                    let (stream, addr) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            warn!("Accept failed: {}", e);
                            continue;
                        }
                    };
                    let peer = next_peer;
                    next_peer += 1;
                    let events = inbound.clone();
                    let frames = frames_tx.subscribe();
                    tokio::spawn(async move {
                        if let Err(e) = handle_peer(stream, addr, peer, events, frames).await {
                            error!("Connection error from {}: {}", addr, e);
                        }
                    });
                }
            }
        }

        fanout.abort();
        info!("Host transport stopped");
        Ok(())
    }
}

async fn handle_peer(
    stream: TcpStream,
    addr: SocketAddr,
    peer: PeerId,
    events: UnboundedSender<PeerEvent>,
    mut frames: broadcast::Receiver<Bytes>,
) -> Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("Peer {} connected from {}", peer, addr);
    let (mut write, mut read) = ws_stream.split();
    let _ = events.send(PeerEvent::Joined(peer));

    let result: Result<()> = loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Binary(data))) => match Intent::decode(&data) {
                        Ok(intent) => {
                            let _ = events.send(PeerEvent::Intent(peer, intent));
                        }
                        Err(e) => warn!("Dropping malformed frame from peer {}: {}", peer, e),
                    },
                    Some(Ok(Message::Close(_))) | None => break Ok(()),
                    Some(Err(e)) => break Err(e.into()),
                    Some(Ok(_)) => {}
                }
            }
            frame = frames.recv() => {
                match frame {
                    Ok(bytes) => {
                        if let Err(e) = write.send(Message::Binary(bytes)).await {
                            break Err(e.into());
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("Peer {} skipped {} broadcasts", peer, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        let _ = write.send(Message::Close(None)).await;
                        break Ok(());
                    }
                }
            }
        }
    };

    let _ = events.send(PeerEvent::Left(peer));
    info!("Peer {} disconnected", peer);
    result
}
