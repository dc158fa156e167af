//! WebSocket transport for the client

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Client transport errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },

    #[error("connection closed")]
    Closed,
}

/// What the reader task observed
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Message(ServerMsg),
    Closed,
}

/// Open connection: a send queue and a non-blocking inbound queue
pub struct Connection {
    outgoing: mpsc::UnboundedSender<ClientMsg>,
    incoming: mpsc::UnboundedReceiver<TransportEvent>,
}

impl Connection {
    /// Connect to `host:port` and start the reader and writer tasks
    pub async fn open(addr: &str) -> Result<Self, ClientError> {
        let url = format!("ws://{addr}/ws");
        info!("Connecting to {}...", url);

        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|source| ClientError::Connect {
                url: url.clone(),
                source,
            })?;
        info!("WebSocket connected");

        let (mut write, mut read) = ws_stream.split();
        let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel::<ClientMsg>();
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel::<TransportEvent>();

        // Reader task: server -> inbound queue
        tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ServerMsg>(&text) {
                        Ok(msg) => {
                            if incoming_tx.send(TransportEvent::Message(msg)).is_err() {
                                return;
                            }
                        }
                        Err(e) => warn!(error = %e, "Failed to parse server message"),
                    },
                    Ok(Message::Close(_)) => {
                        info!("Server closed connection");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!(error = %e, "WebSocket read error");
                        break;
                    }
                }
            }
            let _ = incoming_tx.send(TransportEvent::Closed);
        });

        // Writer task: send queue -> server
        tokio::spawn(async move {
            while let Some(msg) = outgoing_rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        error!(error = %e, "Failed to encode client message");
                        continue;
                    }
                };
                if let Err(e) = write.send(Message::Text(json)).await {
                    debug!(error = %e, "Failed to send message");
                    break;
                }
            }
            let _ = write.close().await;
        });

        Ok(Self {
            outgoing: outgoing_tx,
            incoming: incoming_rx,
        })
    }

    pub fn send(&self, msg: ClientMsg) -> Result<(), ClientError> {
        self.outgoing.send(msg).map_err(|_| ClientError::Closed)
    }

    /// Next inbound event, or `None` if nothing is waiting
    pub fn poll(&mut self) -> Option<TransportEvent> {
        match self.incoming.try_recv() {
            Ok(event) => Some(event),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => Some(TransportEvent::Closed),
        }
    }
}
