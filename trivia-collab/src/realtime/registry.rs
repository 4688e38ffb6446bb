use dashmap::DashMap;
use log::debug;

use crate::{CollabEvent, PrimaryKey};

use super::{ConnectionHandle, ConnectionId};

/// Maps authenticated users to their live socket connection.
///
/// A user has at most one registered connection, the most recent one.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    connections: DashMap<PrimaryKey, ConnectionHandle>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the connection of a user, replacing any previous one
    pub fn identify(&self, user_id: PrimaryKey, handle: ConnectionHandle) {
        debug!("User {} identified on connection {}", user_id, handle.id);
        self.connections.insert(user_id, handle);
    }

    pub fn lookup(&self, user_id: PrimaryKey) -> Option<ConnectionHandle> {
        self.connections
            .get(&user_id)
            .map(|handle| handle.clone())
            .filter(|handle| !handle.is_closed())
    }

    pub fn is_online(&self, user_id: PrimaryKey) -> bool {
        self.lookup(user_id).is_some()
    }

    /// Removes the mapping of a user, but only if it still points to the given connection.
    /// A newer connection registered in the meantime is left alone.
    pub fn forget(&self, user_id: PrimaryKey, connection_id: ConnectionId) {
        let removed = self
            .connections
            .remove_if(&user_id, |_, handle| handle.id == connection_id);

        if removed.is_some() {
            debug!("User {} went offline", user_id);
        }
    }

    /// Best-effort push to a user, returns whether the event was handed to a connection
    pub fn push(&self, user_id: PrimaryKey, event: CollabEvent) -> bool {
        match self.lookup(user_id) {
            Some(handle) => handle.push(event),
            None => {
                debug!("User {} is not connected, skipping push", user_id);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> CollabEvent {
        CollabEvent::GameStarted {
            session_code: "ABC234".to_string(),
        }
    }

    #[test]
    fn test_push_reaches_identified_user() {
        let registry = ChannelRegistry::new();
        let (handle, mut receiver) = ConnectionHandle::new();

        registry.identify(1, handle);

        assert!(registry.push(1, event()), "push is delivered");
        assert!(receiver.try_recv().is_ok(), "event arrives at the connection");
        assert!(!registry.push(2, event()), "unknown users are skipped");
    }

    #[test]
    fn test_forget_keeps_newer_connection() {
        let registry = ChannelRegistry::new();
        let (old, _old_receiver) = ConnectionHandle::new();
        let (new, _new_receiver) = ConnectionHandle::new();
        let old_id = old.id;
        let new_id = new.id;

        registry.identify(1, old);
        registry.identify(1, new);
        registry.forget(1, old_id);

        assert_eq!(
            registry.lookup(1).map(|h| h.id),
            Some(new_id),
            "stale disconnect doesn't evict the reconnected user"
        );

        registry.forget(1, new_id);
        assert!(!registry.is_online(1));
    }

    #[test]
    fn test_closed_connection_is_offline() {
        let registry = ChannelRegistry::new();
        let (handle, receiver) = ConnectionHandle::new();

        registry.identify(1, handle);
        drop(receiver);

        assert!(!registry.is_online(1), "a dropped socket is not online");
        assert!(!registry.push(1, event()), "push to a dropped socket fails silently");
    }
}
