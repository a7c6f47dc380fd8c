use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout};

use crate::auth::middleware::Role;
use crate::state::AppState;
use crate::ws::protocol;

/// Ping interval: server sends WebSocket ping every 30 seconds.
/// Prevents connection leaks from abrupt disconnects.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Pong timeout: if pong not received within 10 seconds after ping, close.
const PONG_TIMEOUT: Duration = Duration::from_secs(10);

/// Run the actor-per-connection pattern for an authenticated WebSocket.
///
/// Splits the WebSocket into reader and writer halves:
/// - Writer task: owns the sink, forwards messages from an mpsc channel
/// - Reader loop: processes incoming frames, dispatches to the protocol layer
///
/// The mpsc channel is the connection handle the registry hands out; any part
/// of the system reaches this client by cloning it. Registration happens
/// before the first frame is read, so directed events addressed to this user
/// are routable from the moment the actor starts.
pub async fn run_connection(socket: WebSocket, state: AppState, user_id: String, role: Role) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<Message>();

    // Last writer wins: a second login for the same user replaces the
    // previous route. The old actor still runs until its socket drops, but
    // no longer receives directed events.
    let conn_id = state.connections.register(&user_id, role, tx.clone());

    tracing::info!(
        user_id = %user_id,
        role = role.as_str(),
        "WebSocket actor started"
    );

    // Spawn writer task: forwards mpsc messages to WebSocket sink
    let writer_handle = tokio::spawn(writer_task(ws_sender, rx));

    // Track pong reception
    let (pong_tx, mut pong_rx) = mpsc::unbounded_channel::<()>();

    // Spawn ping task: sends periodic pings and monitors pong responses
    let ping_tx = tx.clone();
    let ping_handle = tokio::spawn(async move {
        let mut ping_timer = interval(PING_INTERVAL);
        // Skip the first immediate tick
        ping_timer.tick().await;

        loop {
            ping_timer.tick().await;

            if ping_tx.send(Message::Ping(vec![1, 2, 3, 4].into())).is_err() {
                // Writer task has died, connection is gone
                break;
            }

            match timeout(PONG_TIMEOUT, pong_rx.recv()).await {
                Ok(Some(())) => {}
                _ => {
                    tracing::warn!("Pong timeout, closing connection");
                    let _ = ping_tx.send(Message::Close(Some(CloseFrame {
                        code: 1001,
                        reason: "Pong timeout".into(),
                    })));
                    break;
                }
            }
        }
    });

    // Reader loop: process incoming WebSocket frames
    loop {
        match ws_receiver.next().await {
            Some(Ok(msg)) => match msg {
                Message::Text(text) => {
                    protocol::handle_text_frame(&text, &tx, &state, &user_id, role, conn_id).await;
                }
                Message::Binary(_) => {
                    tracing::debug!(
                        user_id = %user_id,
                        "Received binary frame (protocol is JSON text), ignoring"
                    );
                }
                Message::Pong(_) => {
                    let _ = pong_tx.send(());
                }
                Message::Ping(data) => {
                    let _ = tx.send(Message::Pong(data));
                }
                Message::Close(frame) => {
                    tracing::info!(
                        user_id = %user_id,
                        reason = ?frame,
                        "Client initiated close"
                    );
                    break;
                }
            },
            Some(Err(e)) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    "WebSocket receive error"
                );
                break;
            }
            None => {
                tracing::info!(user_id = %user_id, "WebSocket stream ended");
                break;
            }
        }
    }

    // Cleanup: abort writer and ping tasks
    writer_handle.abort();
    ping_handle.abort();

    // Room memberships never survive the connection.
    state.rooms.leave_all(conn_id);

    // Handle-matched removal: if a newer connection for this user has
    // already replaced us, its entry stays.
    state.connections.unregister(&user_id, conn_id);

    tracing::info!(user_id = %user_id, "WebSocket actor stopped");
}

/// Writer task: receives messages from mpsc channel and forwards them to the WebSocket sink.
async fn writer_task(
    mut ws_sender: futures_util::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(msg) = rx.recv().await {
        if ws_sender.send(msg).await.is_err() {
            // WebSocket send failed, connection is broken
            break;
        }
    }
}
