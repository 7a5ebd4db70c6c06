//! Observer side: one websocket to the Authority.

use futures_util::{SinkExt, StreamExt};
use protocol::{Intent, StateBroadcast};
use tokio::sync::watch;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{info, warn};

use crate::error::Result;
use crate::sync::LinkPort;

/// Drives an [`ObserverLink`](crate::sync::ObserverLink) over a websocket.
#[derive(Debug)]
pub struct JoinTransport {
    url: String,
    port: LinkPort<StateBroadcast, Intent>,
}

impl JoinTransport {
    pub fn new(url: impl Into<String>, port: LinkPort<StateBroadcast, Intent>) -> Self {
        Self { url: url.into(), port }
    }

    /// Connect and pump messages until either side closes or `shutdown`
    /// turns true.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let (ws_stream, _) = connect_async(self.url.as_str()).await?;
        info!("Connected to {}", self.url);
        let (mut write, mut read) = ws_stream.split();
        let LinkPort { inbound, mut outbound } = self.port;

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Binary(data))) => match StateBroadcast::decode(&data) {
                            Ok(state) => {
                                if inbound.send(state).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("Dropping malformed broadcast: {}", e),
                        },
                        Some(Ok(Message::Close(_))) | None => {
                            info!("Authority closed the connection");
                            break;
                        }
                        Some(Err(e)) => return Err(e.into()),
                        Some(Ok(_)) => {}
                    }
                }
                intent = outbound.recv() => {
                    match intent {
                        Some(intent) => write.send(Message::Binary(intent.encode())).await?,
                        None => break,
                    }
                }
            }
        }
        Ok(())
    }
}
