//! Message REST surface: history, unified send, conversation list, delete,
//! search. The send path goes through the same create-and-route operation as
//! the socket path; only the acknowledgment differs.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::middleware::Claims;
use crate::db::{self, models::MessageType, store};
use crate::state::AppState;
use crate::ws::router::{self, DomainEvent, SendMessageError};

const DEFAULT_HISTORY_LIMIT: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

/// GET /api/messages/{userId}
/// Conversation between the caller and `userId`, oldest first.
pub async fn history(
    State(state): State<AppState>,
    claims: Claims,
    Path(other_user_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Value>, StatusCode> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT).min(500);
    let me = claims.sub;

    let messages = db::with_conn(&state.db, move |conn| {
        store::messages_between(conn, &me, &other_user_id, limit)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
    })
    .await?;

    Ok(Json(json!({ "success": true, "data": messages })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub to: String,
    pub message: String,
    #[serde(rename = "type", default)]
    pub msg_type: MessageType,
}

/// POST /api/messages
pub async fn send(
    State(state): State<AppState>,
    claims: Claims,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let stored = router::create_and_route_message(
        &state,
        &claims.sub,
        claims.role,
        &req.to,
        &req.message,
        req.msg_type,
    )
    .await
    .map_err(|e| match e {
        SendMessageError::InvalidPayload => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    })?;

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": stored }))))
}

/// GET /api/messages/conversations/list
/// One entry per chat partner, carrying the most recent message.
pub async fn conversations(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<Value>, StatusCode> {
    let me = claims.sub.clone();
    let all = db::with_conn(&state.db, {
        let me = me.clone();
        move |conn| {
            store::messages_for_user(conn, &me).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
        }
    })
    .await?;

    // Messages arrive newest first, so the first one seen per partner is
    // the conversation head.
    let mut latest: HashMap<String, Value> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    for msg in all {
        let other = if msg.from == me {
            msg.to.clone()
        } else {
            msg.from.clone()
        };
        if !latest.contains_key(&other) {
            order.push(other.clone());
            latest.insert(
                other.clone(),
                json!({ "userId": other, "lastMessage": msg }),
            );
        }
    }

    let data: Vec<Value> = order
        .into_iter()
        .filter_map(|key| latest.remove(&key))
        .collect();

    Ok(Json(json!({ "success": true, "data": data })))
}

/// DELETE /api/messages/{messageId}
/// Only the sender may delete; the other participant is notified live.
pub async fn delete(
    State(state): State<AppState>,
    claims: Claims,
    Path(message_id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let me = claims.sub.clone();
    let lookup_id = message_id.clone();
    let message = db::with_conn(&state.db, move |conn| {
        let message = store::find_message_by_id(conn, &lookup_id)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .ok_or(StatusCode::NOT_FOUND)?;
        if message.from != me {
            return Err(StatusCode::FORBIDDEN);
        }
        store::delete_message(conn, &lookup_id).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        Ok(message)
    })
    .await?;

    router::route(
        &state.connections,
        DomainEvent::MessageDeleted {
            message_id,
            recipient: message.to,
        },
    );

    Ok(Json(json!({ "success": true, "message": "Message deleted" })))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// GET /api/messages/search?q=...
pub async fn search(
    State(state): State<AppState>,
    claims: Claims,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, StatusCode> {
    let term = query.q.trim().to_string();
    if term.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let me = claims.sub;
    let messages = db::with_conn(&state.db, move |conn| {
        store::search_messages(conn, &me, &term).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
    })
    .await?;

    Ok(Json(json!({ "success": true, "data": messages })))
}
