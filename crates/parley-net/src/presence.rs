//! Online-user tracking.
//!
//! Maintains the process-wide set of currently online users, rebuilt
//! wholesale from hub snapshots and updated incrementally on
//! online/offline events. Cleared entirely when the channel disconnects.

use std::collections::HashSet;

use tracing::debug;

use parley_shared::types::UserId;

/// Tracks which users currently hold a live hub connection.
#[derive(Debug, Clone, Default)]
pub struct PresenceTracker {
    online: HashSet<UserId>,
}

impl PresenceTracker {
    /// Create a new, empty presence tracker.
    pub fn new() -> Self {
        Self {
            online: HashSet::new(),
        }
    }

    /// Replace the entire set with a fresh snapshot from the hub.
    ///
    /// Snapshot application never merges: any user absent from the
    /// snapshot is dropped, however recently they were seen.
    pub fn apply_snapshot(&mut self, users: Vec<UserId>) {
        self.online.clear();
        self.online.extend(users);
        debug!(count = self.online.len(), "Applied presence snapshot");
    }

    /// Record a user coming online. Returns `true` if they were not
    /// already tracked.
    pub fn on_online(&mut self, user: UserId) -> bool {
        let added = self.online.insert(user);
        if added {
            debug!(count = self.online.len(), "User came online");
        }
        added
    }

    /// Record a user going offline. Returns `true` if they were tracked.
    pub fn on_offline(&mut self, user: &UserId) -> bool {
        let removed = self.online.remove(user);
        if removed {
            debug!(count = self.online.len(), "User went offline");
        }
        removed
    }

    /// Drop all presence state. Called on channel disconnect.
    pub fn clear(&mut self) {
        self.online.clear();
    }

    /// Check whether a given user is currently online.
    pub fn is_online(&self, user: &UserId) -> bool {
        self.online.contains(user)
    }

    /// Return all currently online users (snapshot).
    pub fn online_users(&self) -> Vec<UserId> {
        self.online.iter().cloned().collect()
    }

    /// Return the number of online users.
    pub fn online_count(&self) -> usize {
        self.online.len()
    }

    pub fn is_empty(&self) -> bool {
        self.online.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::new(id)
    }

    #[test]
    fn test_online_offline() {
        let mut tracker = PresenceTracker::new();

        assert!(!tracker.is_online(&user("u1")));
        assert!(tracker.on_online(user("u1")));
        assert!(tracker.is_online(&user("u1")));
        assert_eq!(tracker.online_count(), 1);

        // Re-announcing is not a new arrival
        assert!(!tracker.on_online(user("u1")));

        assert!(tracker.on_offline(&user("u1")));
        assert!(!tracker.is_online(&user("u1")));
        assert!(!tracker.on_offline(&user("u1")));
    }

    #[test]
    fn test_snapshot_replaces_stale_state() {
        let mut tracker = PresenceTracker::new();
        tracker.on_online(user("stale-1"));
        tracker.on_online(user("stale-2"));

        tracker.apply_snapshot(vec![user("u1"), user("u2")]);

        assert_eq!(tracker.online_count(), 2);
        assert!(tracker.is_online(&user("u1")));
        assert!(tracker.is_online(&user("u2")));
        assert!(!tracker.is_online(&user("stale-1")));
        assert!(!tracker.is_online(&user("stale-2")));
    }

    #[test]
    fn test_clear() {
        let mut tracker = PresenceTracker::new();
        tracker.apply_snapshot(vec![user("u1"), user("u2"), user("u3")]);
        assert!(!tracker.is_empty());

        tracker.clear();
        assert!(tracker.is_empty());
        assert_eq!(tracker.online_users(), Vec::<UserId>::new());
    }
}
