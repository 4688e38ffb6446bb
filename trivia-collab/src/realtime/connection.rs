use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::{util::Id, CollabEvent};

pub type ConnectionId = Id<ConnectionHandle>;

/// A handle to a live socket connection, used to push events to it
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    sender: UnboundedSender<CollabEvent>,
}

impl ConnectionHandle {
    /// Creates a new handle along with the receiving end the socket should drain
    pub fn new() -> (Self, UnboundedReceiver<CollabEvent>) {
        let (sender, receiver) = unbounded_channel();

        let handle = Self {
            id: ConnectionId::new(),
            sender,
        };

        (handle, receiver)
    }

    /// Pushes an event to the connection, returning false if it has gone away
    pub fn push(&self, event: CollabEvent) -> bool {
        self.sender.send(event).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
