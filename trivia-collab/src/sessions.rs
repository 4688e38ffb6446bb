use log::{debug, info, warn};

use crate::{
    util::session_code, CollabContext, CollabError, CollabEvent, CollabResult, DatabaseError,
    NewSession, PrimaryKey, QuestionData, QuestionFilter, SessionData, SessionPreferences,
};

/// Manages quiz sessions and their scores
pub struct SessionManager {
    context: CollabContext,
}

impl SessionManager {
    /// How many times a fresh code is drawn if the previous one was taken
    const MAX_CODE_ATTEMPTS: usize = 8;

    pub fn new(context: &CollabContext) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// Creates a new session with the initiator as its first participant
    pub async fn create_session(
        &self,
        initiator: &str,
        preferences: SessionPreferences,
    ) -> CollabResult<SessionData> {
        for _ in 0..Self::MAX_CODE_ATTEMPTS {
            let new_session = NewSession {
                code: session_code(),
                participants: vec![initiator.to_string()],
                preferences: preferences.clone(),
            };

            match self.context.database.create_session(new_session).await {
                Ok(session) => {
                    info!("Session {} created by {}", session.code, initiator);
                    return Ok(session);
                }
                Err(DatabaseError::Conflict { value, .. }) => {
                    debug!("Session code {} was taken, drawing another", value)
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!("Could not find a free session code");
        Err(CollabError::conflict("Could not allocate a session code"))
    }

    pub async fn session(&self, code: &str) -> CollabResult<SessionData> {
        Ok(self.context.database.session_by_code(code).await?)
    }

    /// Adds a user to a session, joining twice has no effect
    pub async fn join_session(&self, code: &str, user_id: PrimaryKey) -> CollabResult<SessionData> {
        let mut session = self.session(code).await?;

        if session.add_participant(&user_id.to_string()) {
            session = self.context.database.save_session(&session).await?;
            info!("User {} joined session {}", user_id, code);
        }

        self.context.session_channels.broadcast(
            code,
            CollabEvent::PlayerJoined {
                session_code: session.code.clone(),
                user_id,
                participants: session.participants.clone(),
            },
        );

        Ok(session)
    }

    /// Starts the game of a session. The session must be active.
    pub async fn start_session(&self, code: &str) -> CollabResult<SessionData> {
        let session = self.session(code).await?;

        if !session.active {
            return Err(CollabError::invalid_state("Session is not active"));
        }

        info!("Session {} started", code);
        self.context.session_channels.broadcast(
            code,
            CollabEvent::GameStarted {
                session_code: session.code.clone(),
            },
        );

        Ok(session)
    }

    /// Ends a session, marking it inactive
    pub async fn end_session(&self, code: &str) -> CollabResult<SessionData> {
        let mut session = self.session(code).await?;

        session.active = false;
        let session = self.context.database.save_session(&session).await?;

        info!("Session {} ended", code);
        self.context.session_channels.broadcast(
            code,
            CollabEvent::GameEnded {
                session_code: session.code.clone(),
                scores: session.scores.clone(),
            },
        );

        Ok(session)
    }

    /// Sets the score of a player, keyed by their name
    pub async fn update_score(
        &self,
        code: &str,
        player_name: &str,
        score: i64,
    ) -> CollabResult<SessionData> {
        let mut session = self.session(code).await?;

        session.upsert_score(player_name, score);
        let session = self.context.database.save_session(&session).await?;

        self.context.session_channels.broadcast(
            code,
            CollabEvent::ScoreUpdated {
                session_code: session.code.clone(),
                player_name: player_name.to_string(),
                score,
                scores: session.scores.clone(),
            },
        );

        Ok(session)
    }

    pub async fn list_questions(&self, filter: &QuestionFilter) -> CollabResult<Vec<QuestionData>> {
        Ok(self.context.database.list_questions(filter).await?)
    }
}

#[cfg(test)]
mod tests {
    use crate::{realtime::ConnectionHandle, test_util::collab, QuestionContent, ScoreEntry};

    use super::*;

    #[tokio::test]
    async fn test_create_session() {
        let collab = collab();

        let session = collab
            .sessions
            .create_session("alice", Default::default())
            .await
            .unwrap();

        assert_eq!(session.code.len(), 6);
        assert_eq!(session.participants, vec!["alice".to_string()]);
        assert!(session.active, "sessions start active");
        assert!(session.scores.is_empty());
    }

    #[tokio::test]
    async fn test_join_is_idempotent() {
        let collab = collab();
        let session = collab
            .sessions
            .create_session("alice", Default::default())
            .await
            .unwrap();

        collab.sessions.join_session(&session.code, 2).await.unwrap();
        let joined = collab.sessions.join_session(&session.code, 2).await.unwrap();

        assert_eq!(
            joined.participants,
            vec!["alice".to_string(), "2".to_string()],
            "no duplicate participants"
        );
    }

    #[tokio::test]
    async fn test_missing_session_is_not_found() {
        let collab = collab();

        assert!(matches!(
            collab.sessions.join_session("NOPE22", 1).await,
            Err(CollabError::NotFound { .. })
        ));
        assert!(matches!(
            collab.sessions.end_session("NOPE22").await,
            Err(CollabError::NotFound { .. })
        ));
        assert!(matches!(
            collab.sessions.update_score("NOPE22", "alice", 1).await,
            Err(CollabError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_start_requires_active_session() {
        let collab = collab();
        let session = collab
            .sessions
            .create_session("alice", Default::default())
            .await
            .unwrap();

        assert!(collab.sessions.start_session(&session.code).await.is_ok());

        collab.sessions.end_session(&session.code).await.unwrap();

        assert!(matches!(
            collab.sessions.start_session(&session.code).await,
            Err(CollabError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_scores_are_upserted_and_broadcast() {
        let collab = collab();
        let session = collab
            .sessions
            .create_session("alice", Default::default())
            .await
            .unwrap();

        let (handle, mut receiver) = ConnectionHandle::new();
        collab
            .context
            .session_channels
            .subscribe(&session.code, handle);

        collab
            .sessions
            .update_score(&session.code, "alice", 10)
            .await
            .unwrap();
        let session = collab
            .sessions
            .update_score(&session.code, "alice", 20)
            .await
            .unwrap();

        assert_eq!(
            session.scores,
            vec![ScoreEntry {
                player_name: "alice".to_string(),
                score: 20
            }],
            "last write wins"
        );

        assert!(matches!(
            receiver.try_recv(),
            Ok(CollabEvent::ScoreUpdated { score: 10, .. })
        ));
        assert!(matches!(
            receiver.try_recv(),
            Ok(CollabEvent::ScoreUpdated { score: 20, .. })
        ));
    }

    #[tokio::test]
    async fn test_list_questions_filters() {
        let collab = collab();

        for (category, difficulty) in [("science", "easy"), ("history", "hard")] {
            collab
                .context
                .database
                .create_question(QuestionContent {
                    question: "?".to_string(),
                    options: vec!["a".to_string(), "b".to_string()],
                    answer: "a".to_string(),
                    category: Some(category.to_string()),
                    difficulty: Some(difficulty.to_string()),
                    image: None,
                })
                .await
                .unwrap();
        }

        let all = collab
            .sessions
            .list_questions(&QuestionFilter {
                difficulty: Some("all".to_string()),
                category: None,
            })
            .await
            .unwrap();

        let hard = collab
            .sessions
            .list_questions(&QuestionFilter {
                difficulty: Some("hard".to_string()),
                category: None,
            })
            .await
            .unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(hard.len(), 1);
        assert_eq!(hard[0].content.category.as_deref(), Some("history"));
    }
}
