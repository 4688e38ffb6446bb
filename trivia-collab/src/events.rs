use crate::{InvitationData, PrimaryKey, ScoreEntry};

/// Events pushed to connected clients
#[derive(Debug, Clone)]
pub enum CollabEvent {
    /// A user joined a session
    PlayerJoined {
        session_code: String,
        user_id: PrimaryKey,
        participants: Vec<String>,
    },
    /// A player's score changed in a session
    ScoreUpdated {
        session_code: String,
        player_name: String,
        score: i64,
        scores: Vec<ScoreEntry>,
    },
    GameStarted {
        session_code: String,
    },
    GameEnded {
        session_code: String,
        scores: Vec<ScoreEntry>,
    },
    /// A user was invited to a session, sent to the recipient
    GameInvitation {
        invitation: InvitationData,
    },
    /// An invitation was accepted, sent to the sender
    InvitationAccepted {
        invitation_id: PrimaryKey,
        session_code: String,
        recipient_id: PrimaryKey,
        recipient_username: String,
    },
    /// An invitation was declined, sent to the sender
    InvitationDeclined {
        invitation_id: PrimaryKey,
        recipient_id: PrimaryKey,
        recipient_username: String,
    },
    /// A user sent a friend request, sent to the target
    FriendRequest {
        request_id: PrimaryKey,
        from_id: PrimaryKey,
        from_username: String,
    },
}
