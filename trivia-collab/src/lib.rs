mod admin;
mod auth;
mod config;
mod content;
mod db;
mod errors;
mod events;
mod invitations;
pub mod realtime;
mod sessions;
mod social;
mod submissions;
mod token;
mod util;

#[cfg(test)]
mod test_util;

use std::sync::Arc;

pub use admin::*;
pub use auth::*;
pub use config::*;
pub use content::*;
pub use db::*;
pub use errors::*;
pub use events::*;
pub use invitations::*;
pub use sessions::*;
pub use social::*;
pub use submissions::*;
pub use token::*;
pub use util::{session_code, SESSION_CODE_ALPHABET, SESSION_CODE_LENGTH};

use realtime::{ChannelRegistry, SessionChannels};

/// The trivia collab system, facilitating authentication, sessions, friends, invitations and moderation.
pub struct Collab {
    pub context: CollabContext,

    pub auth: Auth,
    pub sessions: SessionManager,
    pub social: SocialManager,
    pub invitations: InvitationManager,
    pub submissions: SubmissionManager,
    pub admin: Admin,
}

/// A type passed to the various components of the collab system, to access state and push events.
#[derive(Clone)]
pub struct CollabContext {
    pub database: ArcedDatabase,
    pub config: Arc<Config>,
    /// Live connections of identified users
    pub channels: Arc<ChannelRegistry>,
    /// Live connections subscribed to a session
    pub session_channels: Arc<SessionChannels>,
}

impl Collab {
    pub fn new(database: ArcedDatabase, config: Config) -> Self {
        let context = CollabContext {
            database,
            config: Arc::new(config),
            channels: Default::default(),
            session_channels: Default::default(),
        };

        Self {
            auth: Auth::new(&context),
            sessions: SessionManager::new(&context),
            social: SocialManager::new(&context),
            invitations: InvitationManager::new(&context),
            submissions: SubmissionManager::new(&context),
            admin: Admin::new(&context),
            context,
        }
    }
}
