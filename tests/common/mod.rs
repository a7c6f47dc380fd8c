//! Shared helpers for integration tests: spawn a real server on a random
//! port and mint tokens against its signing key.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use taskdesk_server::auth::jwt;
use taskdesk_server::auth::middleware::Role;
use taskdesk_server::state::AppState;
use taskdesk_server::ws::registry::ConnectionRegistry;
use taskdesk_server::ws::rooms::RoomManager;
use taskdesk_server::{db, routes};

pub struct TestServer {
    pub addr: SocketAddr,
    pub base_url: String,
    pub jwt_secret: Vec<u8>,
}

impl TestServer {
    pub fn token_for(&self, user_id: &str, role: Role) -> String {
        jwt::issue_access_token(&self.jwt_secret, user_id, role).expect("issue token")
    }

    pub fn ws_url(&self, token: &str) -> String {
        format!("ws://{}/ws?token={}", self.addr, token)
    }
}

/// Start the server on a random port with a temp data dir and dev mode on.
pub async fn start_test_server() -> TestServer {
    let tmp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let data_dir = tmp_dir.path().to_str().unwrap().to_string();

    let db = db::init_db(&data_dir).expect("Failed to init DB");
    let jwt_secret =
        jwt::load_or_generate_jwt_secret(&data_dir).expect("Failed to generate JWT secret");

    let state = AppState {
        db,
        jwt_secret: jwt_secret.clone(),
        connections: Arc::new(ConnectionRegistry::new()),
        rooms: Arc::new(RoomManager::new()),
        dev_mode: true,
        frontend_url: "http://localhost:3000".to_string(),
    };

    let app = routes::build_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
        let _keep = tmp_dir;
    });

    TestServer {
        addr,
        base_url: format!("http://{}", addr),
        jwt_secret,
    }
}

pub type WsRead = futures_util::stream::SplitStream<
    WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
>;
pub type WsWrite = futures_util::stream::SplitSink<
    WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
    Message,
>;

/// Connect an authenticated WebSocket and split it.
pub async fn connect_ws(server: &TestServer, user_id: &str, role: Role) -> (WsWrite, WsRead) {
    let token = server.token_for(user_id, role);
    let (stream, _) = tokio_tungstenite::connect_async(server.ws_url(&token))
        .await
        .expect("WS connect");
    stream.split()
}

/// Next JSON event from the socket, or None on timeout.
pub async fn next_event(read: &mut WsRead, wait: Duration) -> Option<serde_json::Value> {
    loop {
        match tokio::time::timeout(wait, read.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => {
                return Some(serde_json::from_str(text.as_str()).expect("valid JSON event"));
            }
            Ok(Some(Ok(Message::Ping(_)))) | Ok(Some(Ok(Message::Pong(_)))) => continue,
            _ => return None,
        }
    }
}

/// Assert no event arrives within the window.
pub async fn expect_silence(read: &mut WsRead, wait: Duration) {
    assert!(
        next_event(read, wait).await.is_none(),
        "expected no event on this connection"
    );
}
