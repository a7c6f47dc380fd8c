//! Event router: delivers domain events to the correct live connections.
//!
//! Delivery is "emit to the target's route if online, otherwise drop". There
//! is no queue and no retry; offline recipients catch up through the REST
//! history endpoints.

use serde_json::Value;
use thiserror::Error;

use crate::auth::middleware::Role;
use crate::db::models::{EmployeeRow, MessageRow, MessageType, TaskRow};
use crate::db::store;
use crate::state::AppState;
use crate::ws::protocol::ServerEvent;
use crate::ws::registry::ConnectionRegistry;

/// Domain events raised by REST mutations. Socket-originated traffic
/// (messages, typing) takes its own paths below.
#[derive(Debug)]
pub enum DomainEvent {
    TaskCreated(TaskRow),
    TaskUpdated(TaskRow),
    TaskStatusUpdated(TaskRow),
    TaskDeleted {
        task_id: String,
        assigned_to: String,
        created_by: String,
    },
    EmployeeAdded(EmployeeRow),
    EmployeeUpdated(EmployeeRow),
    EmployeeDeleted {
        employee_id: String,
    },
    MessageDeleted {
        message_id: String,
        recipient: String,
    },
}

/// Route one domain event per the broadcast rules: task events go to the
/// assignee and the creator (deduplicated when they are the same user),
/// employee events go to every owner connection.
pub fn route(registry: &ConnectionRegistry, event: DomainEvent) {
    match event {
        DomainEvent::TaskCreated(task) => {
            let (assigned_to, created_by) = (task.assigned_to.clone(), task.created_by.clone());
            let targets = task_targets(&assigned_to, &created_by);
            emit_to_each(registry, &targets, &ServerEvent::NewTaskAssigned { task });
        }
        DomainEvent::TaskUpdated(task) => {
            let (assigned_to, created_by) = (task.assigned_to.clone(), task.created_by.clone());
            let targets = task_targets(&assigned_to, &created_by);
            emit_to_each(registry, &targets, &ServerEvent::TaskUpdated { task });
        }
        DomainEvent::TaskStatusUpdated(task) => {
            let (assigned_to, created_by) = (task.assigned_to.clone(), task.created_by.clone());
            let targets = task_targets(&assigned_to, &created_by);
            emit_to_each(registry, &targets, &ServerEvent::TaskStatusUpdated { task });
        }
        DomainEvent::TaskDeleted {
            task_id,
            assigned_to,
            created_by,
        } => {
            let targets = task_targets(&assigned_to, &created_by);
            emit_to_each(registry, &targets, &ServerEvent::TaskDeleted { task_id });
        }
        DomainEvent::EmployeeAdded(employee) => {
            broadcast_to_owners(registry, &ServerEvent::EmployeeAdded { employee });
        }
        DomainEvent::EmployeeUpdated(employee) => {
            broadcast_to_owners(registry, &ServerEvent::EmployeeUpdated { employee });
        }
        DomainEvent::EmployeeDeleted { employee_id } => {
            broadcast_to_owners(registry, &ServerEvent::EmployeeDeleted { employee_id });
        }
        DomainEvent::MessageDeleted {
            message_id,
            recipient,
        } => {
            send_to_user(registry, &recipient, &ServerEvent::MessageDeleted { message_id });
        }
    }
}

/// Assignee and creator, deduplicated when the task is self-assigned.
fn task_targets<'a>(assigned_to: &'a str, created_by: &'a str) -> Vec<&'a str> {
    if assigned_to == created_by {
        vec![assigned_to]
    } else {
        vec![assigned_to, created_by]
    }
}

fn emit_to_each(registry: &ConnectionRegistry, targets: &[&str], event: &ServerEvent) {
    for target in targets {
        send_to_user(registry, target, event);
    }
}

/// Emit to one user's connection. Offline is a silent no-op; a closed
/// channel (connection mid-teardown) is treated the same way.
pub fn send_to_user(registry: &ConnectionRegistry, user_id: &str, event: &ServerEvent) -> bool {
    match registry.lookup(user_id) {
        Some(sender) => sender.send(event.to_ws_message()).is_ok(),
        None => false,
    }
}

/// Emit to every connection currently tagged with the owner role.
pub fn broadcast_to_owners(registry: &ConnectionRegistry, event: &ServerEvent) {
    let msg = event.to_ws_message();
    for sender in registry.senders_with_role(Role::Owner) {
        let _ = sender.send(msg.clone());
    }
}

/// Typing indicator: goes to the specified other user only.
pub fn send_typing(registry: &ConnectionRegistry, from_user: &str, to_user: &str, typing: bool) {
    send_to_user(
        registry,
        to_user,
        &ServerEvent::UserTyping {
            user_id: from_user.to_string(),
            typing,
        },
    );
}

/// Relay a client-originated task update: extract the assignee and creator
/// from the payload and notify both as a task notification.
pub fn relay_task_update(registry: &ConnectionRegistry, payload: Value) {
    let assigned_to = payload
        .get("assignedTo")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let created_by = payload
        .get("createdBy")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let event = ServerEvent::TaskNotification {
        kind: "task-updated".to_string(),
        task: payload,
    };
    for target in task_targets(&assigned_to, &created_by) {
        if !target.is_empty() {
            send_to_user(registry, target, &event);
        }
    }
}

#[derive(Debug, Error)]
pub enum SendMessageError {
    #[error("Recipient and message are required")]
    InvalidPayload,
    #[error("Failed to send message")]
    Persistence(#[from] rusqlite::Error),
    #[error("Failed to send message")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// The single create-and-route message operation, shared by the socket
/// send path and REST POST /api/messages.
///
/// Validates, persists, then pushes `new-message` to the recipient when
/// online. The caller owns the acknowledgment: the socket path answers with
/// `message-sent`, the REST path with a 201 body. A persistence failure
/// surfaces to the caller and nothing is emitted.
pub async fn create_and_route_message(
    state: &AppState,
    from: &str,
    sender_role: Role,
    to: &str,
    body: &str,
    msg_type: MessageType,
) -> Result<MessageRow, SendMessageError> {
    if to.trim().is_empty() || body.trim().is_empty() {
        return Err(SendMessageError::InvalidPayload);
    }

    let stored = {
        let db = state.db.clone();
        let from = from.to_string();
        let to = to.to_string();
        let body = body.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|_| rusqlite::Error::InvalidQuery)?;
            store::create_message(&conn, &from, &to, &body, msg_type)
        })
        .await??
    };

    let delivered = send_to_user(
        &state.connections,
        to,
        &ServerEvent::NewMessage {
            message: stored.clone(),
            sender_role,
        },
    );
    tracing::debug!(
        from = %from,
        to = %to,
        message_id = %stored.id,
        delivered = delivered,
        "Message routed"
    );

    Ok(stored)
}
