//! Integration tests for WebSocket auth, the connection registry, and the
//! event broadcast rules.

mod common;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio_tungstenite::tungstenite::Message;

use common::{connect_ws, expect_silence, next_event, start_test_server};
use taskdesk_server::auth::middleware::Role;

const EVENT_WAIT: Duration = Duration::from_secs(2);
const SILENCE_WAIT: Duration = Duration::from_millis(300);

async fn send_event(write: &mut common::WsWrite, event: serde_json::Value) {
    write
        .send(Message::Text(event.to_string().into()))
        .await
        .expect("WS send");
}

#[tokio::test]
async fn invalid_token_closes_with_4002() {
    let server = start_test_server().await;

    let (mut stream, _) = tokio_tungstenite::connect_async(server.ws_url("garbage"))
        .await
        .expect("upgrade should succeed before auth close");

    match tokio::time::timeout(EVENT_WAIT, stream.next()).await {
        Ok(Some(Ok(Message::Close(Some(frame))))) => {
            assert_eq!(u16::from(frame.code), 4002);
        }
        other => panic!("expected close frame, got {other:?}"),
    }
}

#[tokio::test]
async fn expired_token_closes_with_4001() {
    let server = start_test_server().await;

    // Hand-roll a token whose exp is in the past, signed with the real key.
    let now = chrono::Utc::now().timestamp();
    let claims = taskdesk_server::auth::middleware::Claims {
        sub: "emp-1".to_string(),
        role: Role::Employee,
        iat: now - 7200,
        exp: now - 3600,
    };
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(&server.jwt_secret),
    )
    .unwrap();

    let (mut stream, _) = tokio_tungstenite::connect_async(server.ws_url(&token))
        .await
        .unwrap();

    match tokio::time::timeout(EVENT_WAIT, stream.next()).await {
        Ok(Some(Ok(Message::Close(Some(frame))))) => {
            assert_eq!(u16::from(frame.code), 4001);
        }
        other => panic!("expected close frame, got {other:?}"),
    }
}

#[tokio::test]
async fn message_flow_between_employee_and_owner() {
    let server = start_test_server().await;

    let (mut e1_write, mut e1_read) = connect_ws(&server, "emp-1", Role::Employee).await;
    let (mut o1_write, mut o1_read) = connect_ws(&server, "owner-1", Role::Owner).await;

    send_event(
        &mut e1_write,
        json!({"event": "join-chat", "data": {"otherUserId": "owner-1"}}),
    )
    .await;
    send_event(
        &mut o1_write,
        json!({"event": "join-chat", "data": {"otherUserId": "emp-1"}}),
    )
    .await;

    send_event(
        &mut e1_write,
        json!({"event": "send-message", "data": {"toUserId": "owner-1", "message": "hi", "type": "text"}}),
    )
    .await;

    let received = next_event(&mut o1_read, EVENT_WAIT)
        .await
        .expect("owner should receive new-message");
    assert_eq!(received["event"], "new-message");
    assert_eq!(received["data"]["from"], "emp-1");
    assert_eq!(received["data"]["to"], "owner-1");
    assert_eq!(received["data"]["message"], "hi");
    assert_eq!(received["data"]["senderRole"], "employee");

    let ack = next_event(&mut e1_read, EVENT_WAIT)
        .await
        .expect("sender should receive message-sent");
    assert_eq!(ack["event"], "message-sent");
    assert_eq!(ack["data"]["id"], received["data"]["id"]);
}

#[tokio::test]
async fn offline_recipient_still_gets_ack_and_message_persists() {
    let server = start_test_server().await;

    let (mut e1_write, mut e1_read) = connect_ws(&server, "emp-1", Role::Employee).await;

    send_event(
        &mut e1_write,
        json!({"event": "send-message", "data": {"toUserId": "owner-9", "message": "are you there?"}}),
    )
    .await;

    let ack = next_event(&mut e1_read, EVENT_WAIT)
        .await
        .expect("ack must arrive even with recipient offline");
    assert_eq!(ack["event"], "message-sent");

    // The message is retrievable over REST.
    let client = reqwest::Client::new();
    let resp = client
        .get(format!("{}/api/messages/owner-9", server.base_url))
        .bearer_auth(server.token_for("emp-1", Role::Employee))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["message"], "are you there?");
}

#[tokio::test]
async fn empty_message_body_yields_error_and_no_persistence() {
    let server = start_test_server().await;

    let (mut e1_write, mut e1_read) = connect_ws(&server, "emp-1", Role::Employee).await;

    send_event(
        &mut e1_write,
        json!({"event": "send-message", "data": {"toUserId": "owner-1", "message": "   "}}),
    )
    .await;

    let err = next_event(&mut e1_read, EVENT_WAIT)
        .await
        .expect("sender should receive message-error");
    assert_eq!(err["event"], "message-error");

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("{}/api/messages/owner-1", server.base_url))
        .bearer_auth(server.token_for("emp-1", Role::Employee))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_frame_keeps_connection_open() {
    let server = start_test_server().await;

    let (mut write, mut read) = connect_ws(&server, "emp-1", Role::Employee).await;

    write
        .send(Message::Text("this is not json".into()))
        .await
        .unwrap();

    let err = next_event(&mut read, EVENT_WAIT).await.expect("error event");
    assert_eq!(err["event"], "message-error");

    // Connection still works afterwards.
    send_event(
        &mut write,
        json!({"event": "send-message", "data": {"toUserId": "owner-1", "message": "still alive"}}),
    )
    .await;
    let ack = next_event(&mut read, EVENT_WAIT).await.expect("ack");
    assert_eq!(ack["event"], "message-sent");
}

#[tokio::test]
async fn typing_indicator_goes_to_target_only() {
    let server = start_test_server().await;

    let (mut e1_write, mut e1_read) = connect_ws(&server, "emp-1", Role::Employee).await;
    let (_o1_write, mut o1_read) = connect_ws(&server, "owner-1", Role::Owner).await;
    let (_o2_write, mut o2_read) = connect_ws(&server, "owner-2", Role::Owner).await;

    send_event(
        &mut e1_write,
        json!({"event": "typing-start", "data": {"toUserId": "owner-1"}}),
    )
    .await;

    let typing = next_event(&mut o1_read, EVENT_WAIT).await.expect("typing event");
    assert_eq!(typing["event"], "user-typing");
    assert_eq!(typing["data"]["userId"], "emp-1");
    assert_eq!(typing["data"]["typing"], true);

    expect_silence(&mut o2_read, SILENCE_WAIT).await;
    expect_silence(&mut e1_read, SILENCE_WAIT).await;
}

#[tokio::test]
async fn employee_added_reaches_exactly_the_owner_connections() {
    let server = start_test_server().await;

    let (_w1, mut o1_read) = connect_ws(&server, "owner-1", Role::Owner).await;
    let (_w2, mut o2_read) = connect_ws(&server, "owner-2", Role::Owner).await;
    let (_w3, mut o3_read) = connect_ws(&server, "owner-3", Role::Owner).await;
    let (_w4, mut e1_read) = connect_ws(&server, "emp-1", Role::Employee).await;
    let (_w5, mut e2_read) = connect_ws(&server, "emp-2", Role::Employee).await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/api/owner/employees", server.base_url))
        .bearer_auth(server.token_for("owner-1", Role::Owner))
        .json(&json!({
            "name": "Ana",
            "email": "ana@example.com",
            "department": "Kitchen",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    for read in [&mut o1_read, &mut o2_read, &mut o3_read] {
        let event = next_event(read, EVENT_WAIT).await.expect("owner event");
        assert_eq!(event["event"], "employee-added");
        assert_eq!(event["data"]["employee"]["email"], "ana@example.com");
    }
    expect_silence(&mut e1_read, SILENCE_WAIT).await;
    expect_silence(&mut e2_read, SILENCE_WAIT).await;
}

#[tokio::test]
async fn relayed_task_update_deduplicates_self_assignment() {
    let server = start_test_server().await;

    let (mut o1_write, mut o1_read) = connect_ws(&server, "owner-1", Role::Owner).await;

    send_event(
        &mut o1_write,
        json!({"event": "task-updated", "data": {
            "id": "t1",
            "assignedTo": "owner-1",
            "createdBy": "owner-1",
            "status": "completed",
        }}),
    )
    .await;

    let event = next_event(&mut o1_read, EVENT_WAIT).await.expect("notification");
    assert_eq!(event["event"], "task-notification");
    assert_eq!(event["data"]["type"], "task-updated");
    assert_eq!(event["data"]["task"]["id"], "t1");

    // Exactly one delivery.
    expect_silence(&mut o1_read, SILENCE_WAIT).await;
}

#[tokio::test]
async fn reconnect_replaces_previous_connection() {
    let server = start_test_server().await;

    let (_old_write, mut old_read) = connect_ws(&server, "owner-1", Role::Owner).await;
    // Give the first actor time to register before the replacement lands.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let (_new_write, mut new_read) = connect_ws(&server, "owner-1", Role::Owner).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let (mut e1_write, _e1_read) = connect_ws(&server, "emp-1", Role::Employee).await;
    send_event(
        &mut e1_write,
        json!({"event": "typing-start", "data": {"toUserId": "owner-1"}}),
    )
    .await;

    let event = next_event(&mut new_read, EVENT_WAIT)
        .await
        .expect("newest connection receives directed events");
    assert_eq!(event["event"], "user-typing");
    expect_silence(&mut old_read, SILENCE_WAIT).await;
}
