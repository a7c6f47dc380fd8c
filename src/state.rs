use std::sync::Arc;

use crate::db::DbPool;
use crate::ws::registry::ConnectionRegistry;
use crate::ws::rooms::RoomManager;

/// Shared application state passed to all handlers via axum State extractor.
#[derive(Clone)]
pub struct AppState {
    /// SQLite connection wrapped in Arc<Mutex>
    pub db: DbPool,
    /// JWT signing secret (256-bit random key)
    pub jwt_secret: Vec<u8>,
    /// Live WebSocket connections, one route per user
    pub connections: Arc<ConnectionRegistry>,
    /// Pairwise chat channel memberships
    pub rooms: Arc<RoomManager>,
    /// Development mode: auth endpoints echo access codes back in responses
    /// so clients can be exercised without a mail/SMS provider.
    pub dev_mode: bool,
    /// Frontend base URL for account-setup links
    pub frontend_url: String,
}
