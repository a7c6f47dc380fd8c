//! Pairwise chat channels.
//!
//! A channel has no lifecycle record of its own. It exists only as the set of
//! connections currently joined to it and vanishes when the last one leaves.

use dashmap::DashMap;
use std::collections::HashSet;

use crate::ws::ConnectionId;

/// Canonical channel id for a pair of users. Order-independent: both
/// participants compute the identical id without a lookup table.
pub fn chat_room_id(user_a: &str, user_b: &str) -> String {
    let mut ids = [user_a, user_b];
    ids.sort_unstable();
    format!("{}-{}", ids[0], ids[1])
}

#[derive(Default)]
pub struct RoomManager {
    // room id -> joined connections
    rooms: DashMap<String, HashSet<ConnectionId>>,
    // connection -> joined rooms, so disconnect cleanup is one lookup
    joined: DashMap<ConnectionId, HashSet<String>>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the connection of `user_id` to its chat channel with
    /// `other_user_id`. Membership grants no data access, so no relationship
    /// check is required beyond the connection being authenticated.
    pub fn join_chat(&self, conn_id: ConnectionId, user_id: &str, other_user_id: &str) -> String {
        let room_id = chat_room_id(user_id, other_user_id);
        self.rooms
            .entry(room_id.clone())
            .or_default()
            .insert(conn_id);
        self.joined
            .entry(conn_id)
            .or_default()
            .insert(room_id.clone());

        tracing::debug!(user_id = %user_id, room_id = %room_id, "Joined chat room");
        room_id
    }

    /// Remove a connection from every room it joined. Called on disconnect;
    /// no membership survives a reconnect without a fresh join request.
    pub fn leave_all(&self, conn_id: ConnectionId) {
        let Some((_, room_ids)) = self.joined.remove(&conn_id) else {
            return;
        };
        for room_id in room_ids {
            self.rooms.remove_if_mut(&room_id, |_, members| {
                members.remove(&conn_id);
                members.is_empty()
            });
        }
    }

    pub fn members(&self, room_id: &str) -> Vec<ConnectionId> {
        self.rooms
            .get(room_id)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_member(&self, conn_id: ConnectionId, room_id: &str) -> bool {
        self.rooms
            .get(room_id)
            .map(|m| m.contains(&conn_id))
            .unwrap_or(false)
    }
}
