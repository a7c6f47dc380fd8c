//! Connection registry: the single in-process source of truth for who is
//! online and how to reach them.
//!
//! Policy: at most one live route per user. A second login for the same user
//! replaces the previous entry (last writer wins). Unregister only removes
//! the entry when the caller still holds the registered connection id, so a
//! stale connection's cleanup can never evict a newer one.

use dashmap::DashMap;
use uuid::Uuid;

use crate::auth::middleware::Role;
use crate::ws::{ConnectionId, ConnectionSender};

struct RegistryEntry {
    conn_id: ConnectionId,
    sender: ConnectionSender,
    role: Role,
}

#[derive(Default)]
pub struct ConnectionRegistry {
    entries: DashMap<String, RegistryEntry>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a user's live connection, replacing any previous one.
    /// Returns the connection id the caller must present to unregister.
    pub fn register(&self, user_id: &str, role: Role, sender: ConnectionSender) -> ConnectionId {
        let conn_id = Uuid::now_v7();
        let replaced = self
            .entries
            .insert(
                user_id.to_string(),
                RegistryEntry {
                    conn_id,
                    sender,
                    role,
                },
            )
            .is_some();

        tracing::debug!(
            user_id = %user_id,
            role = role.as_str(),
            replaced = replaced,
            "Connection registered"
        );
        conn_id
    }

    /// Remove a user's entry, but only if it still belongs to `conn_id`.
    /// Returns whether an entry was removed.
    pub fn unregister(&self, user_id: &str, conn_id: ConnectionId) -> bool {
        let removed = self
            .entries
            .remove_if(user_id, |_, entry| entry.conn_id == conn_id)
            .is_some();

        tracing::debug!(
            user_id = %user_id,
            removed = removed,
            "Connection unregistered"
        );
        removed
    }

    /// The live route to a user. None means offline, which callers must
    /// treat as a silent no-op, never an error.
    pub fn lookup(&self, user_id: &str) -> Option<ConnectionSender> {
        self.entries.get(user_id).map(|e| e.sender.clone())
    }

    pub fn role_of(&self, user_id: &str) -> Option<Role> {
        self.entries.get(user_id).map(|e| e.role)
    }

    pub fn list_online(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }

    pub fn online_count(&self) -> usize {
        self.entries.len()
    }

    /// Routes to every connection currently tagged with `role`.
    pub fn senders_with_role(&self, role: Role) -> Vec<ConnectionSender> {
        self.entries
            .iter()
            .filter(|e| e.role == role)
            .map(|e| e.sender.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::ws::Message;
    use tokio::sync::mpsc;

    fn fake_conn() -> (ConnectionSender, mpsc::UnboundedReceiver<Message>) {
        mpsc::unbounded_channel()
    }

    #[test]
    fn lookup_returns_last_registered_handle() {
        let registry = ConnectionRegistry::new();
        let (tx1, _rx1) = fake_conn();
        let (tx2, rx2) = fake_conn();
        drop(rx2);

        registry.register("u1", Role::Employee, tx1);
        registry.register("u1", Role::Employee, tx2);

        // The second sender's receiver was dropped, so the closed flag
        // identifies which handle lookup returned.
        let current = registry.lookup("u1").unwrap();
        assert!(current.is_closed());
        assert_eq!(registry.online_count(), 1);
    }

    #[test]
    fn stale_unregister_does_not_evict_newer_connection() {
        let registry = ConnectionRegistry::new();
        let (tx1, _rx1) = fake_conn();
        let (tx2, _rx2) = fake_conn();

        let old_id = registry.register("u1", Role::Owner, tx1);
        registry.register("u1", Role::Owner, tx2);

        assert!(!registry.unregister("u1", old_id));
        assert!(registry.lookup("u1").is_some());
        assert_eq!(registry.role_of("u1"), Some(Role::Owner));
    }

    #[test]
    fn matching_unregister_removes_entry() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = fake_conn();

        let conn_id = registry.register("u1", Role::Employee, tx);
        assert!(registry.unregister("u1", conn_id));
        assert!(registry.lookup("u1").is_none());
        assert!(registry.role_of("u1").is_none());
        // Repeat cleanup is harmless.
        assert!(!registry.unregister("u1", conn_id));
    }

    #[test]
    fn senders_with_role_filters_by_role() {
        let registry = ConnectionRegistry::new();
        let (o1, _a) = fake_conn();
        let (o2, _b) = fake_conn();
        let (e1, _c) = fake_conn();

        registry.register("owner-1", Role::Owner, o1);
        registry.register("owner-2", Role::Owner, o2);
        registry.register("emp-1", Role::Employee, e1);

        assert_eq!(registry.senders_with_role(Role::Owner).len(), 2);
        assert_eq!(registry.senders_with_role(Role::Employee).len(), 1);

        let mut online = registry.list_online();
        online.sort();
        assert_eq!(online, vec!["emp-1", "owner-1", "owner-2"]);
    }
}
