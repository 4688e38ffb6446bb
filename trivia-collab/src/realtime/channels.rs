use std::collections::HashMap;

use dashmap::DashMap;

use crate::CollabEvent;

use super::{ConnectionHandle, ConnectionId};

/// Tracks which connections are subscribed to which session
#[derive(Debug, Default)]
pub struct SessionChannels {
    sessions: DashMap<String, HashMap<ConnectionId, ConnectionHandle>>,
}

impl SessionChannels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, session_code: &str, handle: ConnectionHandle) {
        self.sessions
            .entry(session_code.to_string())
            .or_default()
            .insert(handle.id, handle);
    }

    /// Removes the connection from every session it's subscribed to
    pub fn unsubscribe_all(&self, connection_id: ConnectionId) {
        self.sessions.retain(|_, subscribers| {
            subscribers.remove(&connection_id);
            !subscribers.is_empty()
        });
    }

    /// Pushes an event to every subscriber of a session, returns how many received it
    pub fn broadcast(&self, session_code: &str, event: CollabEvent) -> usize {
        let Some(subscribers) = self.sessions.get(session_code) else {
            return 0;
        };

        subscribers
            .values()
            .filter(|handle| handle.push(event.clone()))
            .count()
    }

    pub fn subscriber_count(&self, session_code: &str) -> usize {
        self.sessions
            .get(session_code)
            .map_or(0, |subscribers| subscribers.len())
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
    fn test_broadcast_reaches_subscribers_only() {
        let channels = SessionChannels::new();
        let (a, mut a_receiver) = ConnectionHandle::new();
        let (b, mut b_receiver) = ConnectionHandle::new();

        channels.subscribe("ABC234", a);
        channels.subscribe("XYZ789", b);

        assert_eq!(channels.broadcast("ABC234", event()), 1);
        assert!(a_receiver.try_recv().is_ok());
        assert!(b_receiver.try_recv().is_err(), "other sessions are untouched");
        assert_eq!(channels.broadcast("NOPE22", event()), 0);
    }

    #[test]
    fn test_unsubscribe_all() {
        let channels = SessionChannels::new();
        let (a, _a_receiver) = ConnectionHandle::new();
        let id = a.id;

        channels.subscribe("ABC234", a.clone());
        channels.subscribe("XYZ789", a);
        channels.unsubscribe_all(id);

        assert_eq!(channels.subscriber_count("ABC234"), 0);
        assert_eq!(channels.subscriber_count("XYZ789"), 0);
    }
}
