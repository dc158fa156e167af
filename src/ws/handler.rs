//! WebSocket upgrade handler

use std::fmt::Display;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::ServerEvent;
use crate::util::rate_limit::InputThrottle;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection; one socket is one participant
async fn handle_socket(socket: WebSocket, state: AppState) {
    let participant_id = Uuid::new_v4();
    info!(participant_id = %participant_id, "New WebSocket connection");

    let (ws_sink, ws_stream) = socket.split();
    let throttle = InputThrottle::per_second(state.config.input_rate_limit);
    run_session(
        participant_id,
        ws_sink,
        ws_stream,
        state.server.events_tx.clone(),
        throttle,
    )
    .await;

    info!(participant_id = %participant_id, "WebSocket connection closed");
}

/// Register with the tick loop, pump both directions, then report the
/// disconnect. Either half ending closes the session.
async fn run_session<Si, St, E>(
    participant_id: Uuid,
    sink: Si,
    stream: St,
    events_tx: mpsc::Sender<ServerEvent>,
    throttle: InputThrottle,
) where
    Si: Sink<Message> + Unpin + Send + 'static,
    Si::Error: Display + Send,
    St: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let (outbox_tx, outbox_rx) = mpsc::unbounded_channel::<ServerMsg>();
    if events_tx
        .send(ServerEvent::Connected {
            id: participant_id,
            outbox: outbox_tx,
        })
        .await
        .is_err()
    {
        error!(participant_id = %participant_id, "Game loop is gone, closing socket");
        return;
    }

    let mut writer = tokio::spawn(write_loop(participant_id, sink, outbox_rx));

    tokio::select! {
        _ = read_loop(participant_id, stream, &events_tx, throttle) => {}
        _ = &mut writer => {
            debug!(participant_id = %participant_id, "Writer stopped, closing session");
        }
    }

    // Exactly one disconnect per connect; this drops the outbox
    let _ = events_tx
        .send(ServerEvent::Disconnected { id: participant_id })
        .await;
    writer.abort();
}

/// Forward parsed client messages to the tick loop until the socket closes
async fn read_loop<St, E>(
    participant_id: Uuid,
    mut stream: St,
    events_tx: &mpsc::Sender<ServerEvent>,
    mut throttle: InputThrottle,
) where
    St: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !throttle.admit() {
                    warn!(
                        participant_id = %participant_id,
                        dropped = throttle.dropped(),
                        "Rate limited input message"
                    );
                    continue;
                }

                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => {
                        let event = ServerEvent::Message {
                            id: participant_id,
                            msg,
                        };
                        if events_tx.send(event).await.is_err() {
                            debug!(participant_id = %participant_id, "Event channel closed");
                            return;
                        }
                    }
                    Err(e) => {
                        warn!(participant_id = %participant_id, error = %e, "Failed to parse client message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(participant_id = %participant_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(participant_id = %participant_id, "Client initiated close");
                return;
            }
            Err(e) => {
                error!(participant_id = %participant_id, error = %e, "WebSocket error");
                return;
            }
        }
    }
}

/// Forward outbound messages to the socket until either side closes
async fn write_loop<Si>(
    participant_id: Uuid,
    mut sink: Si,
    mut outbox_rx: mpsc::UnboundedReceiver<ServerMsg>,
) where
    Si: Sink<Message> + Unpin,
    Si::Error: Display,
{
    while let Some(msg) = outbox_rx.recv().await {
        if let Err(e) = send_msg(&mut sink, &msg).await {
            debug!(participant_id = %participant_id, error = %e, "WebSocket send failed");
            break;
        }
    }
    let _ = sink.close().await;
}

/// Send a message over WebSocket
async fn send_msg<Si>(sink: &mut Si, msg: &ServerMsg) -> Result<(), String>
where
    Si: Sink<Message> + Unpin,
    Si::Error: Display,
{
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json)).await.map_err(|e| e.to_string())
}
