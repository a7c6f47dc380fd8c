pub mod actor;
pub mod handler;
pub mod protocol;
pub mod registry;
pub mod rooms;
pub mod router;

use tokio::sync::mpsc;
use uuid::Uuid;

/// Type alias for the sender half of a WebSocket connection's channel.
/// Other parts of the system can clone this to push messages to a specific client.
pub type ConnectionSender = mpsc::UnboundedSender<axum::extract::ws::Message>;

/// Opaque identity of a single live connection. Used to tell a stale
/// connection's cleanup apart from a newer connection of the same user.
pub type ConnectionId = Uuid;
