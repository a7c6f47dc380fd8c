//! Wire protocol: JSON text frames carrying `{"event": ..., "data": ...}`.
//!
//! Event names and payload shapes form a closed enumeration on both
//! directions; there is no stringly-typed dispatch anywhere else.

use axum::extract::ws::{Message, Utf8Bytes};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::middleware::Role;
use crate::db::models::{EmployeeRow, MessageRow, MessageType, TaskRow};
use crate::state::AppState;
use crate::ws::router;
use crate::ws::{ConnectionId, ConnectionSender};

/// Events a client may send.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    JoinChat { other_user_id: String },
    #[serde(rename_all = "camelCase")]
    SendMessage {
        to_user_id: String,
        message: String,
        #[serde(rename = "type", default)]
        msg_type: MessageType,
    },
    #[serde(rename_all = "camelCase")]
    TypingStart { to_user_id: String },
    #[serde(rename_all = "camelCase")]
    TypingStop { to_user_id: String },
    /// Relay-only: the payload is passed straight to the task broadcast rule.
    TaskUpdated(Value),
}

/// Events the server may send.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    NewMessage {
        #[serde(flatten)]
        message: MessageRow,
        sender_role: Role,
    },
    MessageSent {
        #[serde(flatten)]
        message: MessageRow,
    },
    MessageError {
        error: String,
    },
    #[serde(rename_all = "camelCase")]
    MessageDeleted {
        message_id: String,
    },
    #[serde(rename_all = "camelCase")]
    UserTyping {
        user_id: String,
        typing: bool,
    },
    TaskNotification {
        #[serde(rename = "type")]
        kind: String,
        task: Value,
    },
    NewTaskAssigned {
        task: TaskRow,
    },
    TaskUpdated {
        task: TaskRow,
    },
    TaskStatusUpdated {
        task: TaskRow,
    },
    #[serde(rename_all = "camelCase")]
    TaskDeleted {
        task_id: String,
    },
    EmployeeAdded {
        employee: EmployeeRow,
    },
    EmployeeUpdated {
        employee: EmployeeRow,
    },
    #[serde(rename_all = "camelCase")]
    EmployeeDeleted {
        employee_id: String,
    },
}

impl ServerEvent {
    /// Encode as a WebSocket text frame. Serialization of these closed
    /// variants cannot fail in practice; a failure is logged and the frame
    /// replaced with a generic error event.
    pub fn to_ws_message(&self) -> Message {
        match serde_json::to_string(self) {
            Ok(json) => Message::Text(Utf8Bytes::from(json)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode server event");
                Message::Text(Utf8Bytes::from_static(
                    r#"{"event":"message-error","data":{"error":"Internal encoding error"}}"#,
                ))
            }
        }
    }
}

/// Handle one incoming text frame: parse the event, dispatch, reply.
/// All failures are answered on the originating connection; none close it.
pub async fn handle_text_frame(
    text: &str,
    tx: &ConnectionSender,
    state: &AppState,
    user_id: &str,
    role: Role,
    conn_id: ConnectionId,
) {
    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(user_id = %user_id, error = %e, "Unparseable client event");
            send_error(tx, "Invalid event payload");
            return;
        }
    };

    match event {
        ClientEvent::JoinChat { other_user_id } => {
            state.rooms.join_chat(conn_id, user_id, &other_user_id);
        }
        ClientEvent::SendMessage {
            to_user_id,
            message,
            msg_type,
        } => {
            match router::create_and_route_message(state, user_id, role, &to_user_id, &message, msg_type)
                .await
            {
                Ok(stored) => {
                    // The ack always goes back, whether or not the recipient
                    // was online to receive the live push.
                    let _ = tx.send(ServerEvent::MessageSent { message: stored }.to_ws_message());
                }
                Err(e) => {
                    tracing::debug!(user_id = %user_id, error = %e, "Message send failed");
                    send_error(tx, &e.to_string());
                }
            }
        }
        ClientEvent::TypingStart { to_user_id } => {
            router::send_typing(&state.connections, user_id, &to_user_id, true);
        }
        ClientEvent::TypingStop { to_user_id } => {
            router::send_typing(&state.connections, user_id, &to_user_id, false);
        }
        ClientEvent::TaskUpdated(payload) => {
            router::relay_task_update(&state.connections, payload);
        }
    }
}

fn send_error(tx: &ConnectionSender, error: &str) {
    let _ = tx.send(
        ServerEvent::MessageError {
            error: error.to_string(),
        }
        .to_ws_message(),
    );
}
