//! Presence registry: live connection records indexed by user.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use relay_core::types::{ConnectionId, UserId};

use super::record::ConnectionRecord;

/// Result of removing a connection that the registry knew about.
#[derive(Debug)]
pub struct Removed {
    /// The record that was removed.
    pub record: ConnectionRecord,
    /// Whether it was the user's last connection (the entry is gone).
    pub was_last: bool,
}

/// User → ordered, non-empty list of that user's live connections.
///
/// Not synchronized; see [`SharedRegistry`] for the handle the router and
/// broadcaster share. None of the operations suspend, so a mutation is
/// always observed whole.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    entries: HashMap<UserId, Vec<ConnectionRecord>>,
}

impl PresenceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record for `user`. Returns `true` if this is the user's
    /// first connection.
    pub fn add_connection(&mut self, user: UserId, record: ConnectionRecord) -> bool {
        let records = self.entries.entry(user).or_default();
        records.push(record);
        records.len() == 1
    }

    /// Removes one record. Unknown users or connections are a no-op.
    pub fn remove_connection(&mut self, user: &UserId, conn_id: ConnectionId) -> Option<Removed> {
        let records = self.entries.get_mut(user)?;
        let index = records.iter().position(|r| r.id == conn_id)?;
        let record = records.remove(index);
        let was_last = records.is_empty();
        if was_last {
            self.entries.remove(user);
        }
        Some(Removed { record, was_last })
    }

    /// Snapshot of a user's records, empty if offline.
    pub fn connections_of(&self, user: &UserId) -> Vec<ConnectionRecord> {
        self.entries.get(user).cloned().unwrap_or_default()
    }

    /// Borrowed view of a user's records, empty if offline.
    pub fn records(&self, user: &UserId) -> &[ConnectionRecord] {
        self.entries.get(user).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The record to mutate in place, if the connection still exists.
    pub fn find_record(
        &mut self,
        user: &UserId,
        conn_id: ConnectionId,
    ) -> Option<&mut ConnectionRecord> {
        let record = self
            .entries
            .get_mut(user)
            .and_then(|records| records.iter_mut().find(|r| r.id == conn_id));
        if record.is_none() {
            tracing::debug!(user_id = %user, conn_id = %conn_id, "Connection record not found");
        }
        record
    }

    /// Read-only access to a single record.
    pub fn get(&self, user: &UserId, conn_id: ConnectionId) -> Option<&ConnectionRecord> {
        self.entries
            .get(user)
            .and_then(|records| records.iter().find(|r| r.id == conn_id))
    }

    /// Whether the user has at least one live connection.
    pub fn is_online(&self, user: &UserId) -> bool {
        self.entries.contains_key(user)
    }

    /// Number of live connections for one user.
    pub fn connection_count_of(&self, user: &UserId) -> usize {
        self.entries.get(user).map(Vec::len).unwrap_or(0)
    }

    /// Total number of live connections.
    pub fn connection_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Number of online users.
    pub fn user_count(&self) -> usize {
        self.entries.len()
    }

    /// Removes every record (process shutdown).
    pub fn drain(&mut self) -> Vec<ConnectionRecord> {
        self.entries.drain().flat_map(|(_, records)| records).collect()
    }
}

/// Cloneable handle to the one registry owned by a relay instance.
///
/// Access goes through closures so a guard can never be held across an
/// `.await`.
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<Mutex<PresenceRegistry>>,
}

impl SharedRegistry {
    /// Creates a handle to a fresh, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PresenceRegistry> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `f` with shared access.
    pub fn read<R>(&self, f: impl FnOnce(&PresenceRegistry) -> R) -> R {
        f(&self.lock())
    }

    /// Run `f` with exclusive access.
    pub fn write<R>(&self, f: impl FnOnce(&mut PresenceRegistry) -> R) -> R {
        f(&mut self.lock())
    }

    /// See [`PresenceRegistry::connections_of`].
    pub fn connections_of(&self, user: &UserId) -> Vec<ConnectionRecord> {
        self.read(|r| r.connections_of(user))
    }

    /// See [`PresenceRegistry::is_online`].
    pub fn is_online(&self, user: &UserId) -> bool {
        self.read(|r| r.is_online(user))
    }

    /// Snapshot of one record.
    pub fn record(&self, user: &UserId, conn_id: ConnectionId) -> Option<ConnectionRecord> {
        self.read(|r| r.get(user, conn_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::record::tests::record_for;

    #[test]
    fn test_first_and_last_transitions() {
        let mut registry = PresenceRegistry::new();
        let alice = UserId::from("alice");
        let (r1, _rx1) = record_for("alice", &[]);
        let (r2, _rx2) = record_for("alice", &[]);
        let (id1, id2) = (r1.id, r2.id);

        assert!(registry.add_connection(alice.clone(), r1));
        assert!(!registry.add_connection(alice.clone(), r2));
        assert_eq!(registry.connection_count_of(&alice), 2);

        let removed = registry.remove_connection(&alice, id1).unwrap();
        assert!(!removed.was_last);
        assert!(registry.is_online(&alice));

        let removed = registry.remove_connection(&alice, id2).unwrap();
        assert!(removed.was_last);
        assert!(!registry.is_online(&alice));
        assert_eq!(registry.user_count(), 0);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut registry = PresenceRegistry::new();
        let alice = UserId::from("alice");
        assert!(registry.remove_connection(&alice, ConnectionId::new()).is_none());

        let (r1, _rx) = record_for("alice", &[]);
        registry.add_connection(alice.clone(), r1);
        assert!(registry.remove_connection(&alice, ConnectionId::new()).is_none());
        assert_eq!(registry.connection_count_of(&alice), 1);
    }

    #[test]
    fn test_online_iff_net_count_positive() {
        let mut registry = PresenceRegistry::new();
        let bob = UserId::from("bob");
        let mut live = Vec::new();
        let mut receivers = Vec::new();

        // add, add, remove, add, remove, remove, remove (extra remove is a no-op)
        let script = [true, true, false, true, false, false, false];
        for add in script {
            if add {
                let (record, rx) = record_for("bob", &[]);
                live.push(record.id);
                receivers.push(rx);
                registry.add_connection(bob.clone(), record);
            } else if let Some(id) = live.pop() {
                registry.remove_connection(&bob, id);
            } else {
                registry.remove_connection(&bob, ConnectionId::new());
            }
            assert_eq!(registry.is_online(&bob), !live.is_empty());
            assert_eq!(registry.connection_count_of(&bob), live.len());
        }
    }

    #[test]
    fn test_connections_of_is_a_snapshot() {
        let mut registry = PresenceRegistry::new();
        let alice = UserId::from("alice");
        let (record, _rx) = record_for("alice", &[]);
        let id = record.id;
        registry.add_connection(alice.clone(), record);

        let snapshot = registry.connections_of(&alice);
        registry
            .find_record(&alice, id)
            .unwrap()
            .enter_conversation(Some("c1".into()));

        assert!(snapshot[0].current_conversation().is_none());
        assert!(registry.get(&alice, id).unwrap().is_in_conversation(&"c1".into()));
    }

    #[test]
    fn test_find_record_missing() {
        let mut registry = PresenceRegistry::new();
        assert!(registry.find_record(&"ghost".into(), ConnectionId::new()).is_none());
    }

    #[test]
    fn test_shared_handle_sees_same_state() {
        let shared = SharedRegistry::new();
        let other = shared.clone();
        let (record, _rx) = record_for("alice", &[]);
        let id = record.id;
        shared.write(|r| r.add_connection("alice".into(), record));
        assert!(other.is_online(&"alice".into()));
        assert!(other.record(&"alice".into(), id).is_some());
    }
}
