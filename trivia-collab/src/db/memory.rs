use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;

use crate::{
    Database, DatabaseError, FriendshipData, FriendshipStatus, InvitationData, InvitationStatus,
    NewFriendship, NewInvitation, NewSession, NewSubmission, NewUser, PrimaryKey,
    QuestionContent, QuestionData, QuestionFilter, Result, SessionData, SubmissionData,
    SubmissionStatus, UpdatedQuestion, UpdatedSubmission, UpdatedUser, UserData,
};

/// An in-memory database, used when no database url is configured and in tests.
pub struct MemoryDatabase {
    invitation_ttl: Duration,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    next_id: PrimaryKey,
    users: BTreeMap<PrimaryKey, UserData>,
    questions: BTreeMap<PrimaryKey, QuestionData>,
    submissions: BTreeMap<PrimaryKey, SubmissionData>,
    sessions: BTreeMap<PrimaryKey, SessionData>,
    friendships: BTreeMap<PrimaryKey, FriendshipData>,
    invitations: BTreeMap<PrimaryKey, InvitationData>,
}

impl State {
    fn next_id(&mut self) -> PrimaryKey {
        self.next_id += 1;
        self.next_id
    }
}

impl MemoryDatabase {
    pub fn new(invitation_ttl: Duration) -> Self {
        Self {
            invitation_ttl,
            state: Default::default(),
        }
    }

    fn is_live(&self, invitation: &InvitationData) -> bool {
        !invitation.is_expired(self.invitation_ttl)
    }

    /// Moves the creation time of an invitation, to simulate the passing of time
    #[cfg(test)]
    pub(crate) fn backdate_invitation(&self, invitation_id: PrimaryKey, by: Duration) {
        if let Some(invitation) = self.state.lock().invitations.get_mut(&invitation_id) {
            invitation.created_at = invitation.created_at - by;
        }
    }
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new(Duration::hours(1))
    }
}

fn not_found(resource: &'static str, identifier: &'static str) -> DatabaseError {
    DatabaseError::NotFound {
        resource,
        identifier,
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData> {
        self.state
            .lock()
            .users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| not_found("user", "id"))
    }

    async fn user_by_username(&self, username: &str) -> Result<UserData> {
        self.state
            .lock()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| not_found("user", "username"))
    }

    async fn users_by_ids(&self, user_ids: &[PrimaryKey]) -> Result<Vec<UserData>> {
        let state = self.state.lock();

        Ok(user_ids
            .iter()
            .filter_map(|id| state.users.get(id).cloned())
            .collect())
    }

    async fn list_users(&self) -> Result<Vec<UserData>> {
        Ok(self.state.lock().users.values().cloned().collect())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserData> {
        let mut state = self.state.lock();

        if state.users.values().any(|u| u.username == new_user.username) {
            return Err(DatabaseError::Conflict {
                resource: "user",
                field: "username",
                value: new_user.username,
            });
        }

        let user = UserData {
            id: state.next_id(),
            username: new_user.username,
            password: new_user.password,
            role: new_user.role,
            created_at: Utc::now(),
        };

        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, updated_user: UpdatedUser) -> Result<UserData> {
        let mut state = self.state.lock();

        if let Some(username) = &updated_user.username {
            let taken = state
                .users
                .values()
                .any(|u| &u.username == username && u.id != updated_user.id);

            if taken {
                return Err(DatabaseError::Conflict {
                    resource: "user",
                    field: "username",
                    value: username.clone(),
                });
            }
        }

        let user = state
            .users
            .get_mut(&updated_user.id)
            .ok_or_else(|| not_found("user", "id"))?;

        if let Some(username) = updated_user.username {
            user.username = username;
        }
        if let Some(password) = updated_user.password {
            user.password = password;
        }
        if let Some(role) = updated_user.role {
            user.role = role;
        }

        Ok(user.clone())
    }

    async fn delete_user(&self, user_id: PrimaryKey) -> Result<()> {
        self.state
            .lock()
            .users
            .remove(&user_id)
            .map(|_| ())
            .ok_or_else(|| not_found("user", "id"))
    }

    async fn question_by_id(&self, question_id: PrimaryKey) -> Result<QuestionData> {
        self.state
            .lock()
            .questions
            .get(&question_id)
            .cloned()
            .ok_or_else(|| not_found("question", "id"))
    }

    async fn list_questions(&self, filter: &QuestionFilter) -> Result<Vec<QuestionData>> {
        Ok(self
            .state
            .lock()
            .questions
            .values()
            .filter(|q| filter.matches(&q.content))
            .cloned()
            .collect())
    }

    async fn create_question(&self, new_question: QuestionContent) -> Result<QuestionData> {
        let mut state = self.state.lock();

        let question = QuestionData {
            id: state.next_id(),
            content: new_question,
            created_at: Utc::now(),
        };

        state.questions.insert(question.id, question.clone());
        Ok(question)
    }

    async fn update_question(&self, updated_question: UpdatedQuestion) -> Result<QuestionData> {
        let mut state = self.state.lock();

        let question = state
            .questions
            .get_mut(&updated_question.id)
            .ok_or_else(|| not_found("question", "id"))?;

        question.content = updated_question.content;
        Ok(question.clone())
    }

    async fn delete_question(&self, question_id: PrimaryKey) -> Result<()> {
        self.state
            .lock()
            .questions
            .remove(&question_id)
            .map(|_| ())
            .ok_or_else(|| not_found("question", "id"))
    }

    async fn submission_by_id(&self, submission_id: PrimaryKey) -> Result<SubmissionData> {
        self.state
            .lock()
            .submissions
            .get(&submission_id)
            .cloned()
            .ok_or_else(|| not_found("submission", "id"))
    }

    async fn list_submissions(
        &self,
        status: Option<SubmissionStatus>,
    ) -> Result<Vec<SubmissionData>> {
        Ok(self
            .state
            .lock()
            .submissions
            .values()
            .rev()
            .filter(|s| status.map_or(true, |status| s.status == status))
            .cloned()
            .collect())
    }

    async fn submissions_by_user(&self, user_id: PrimaryKey) -> Result<Vec<SubmissionData>> {
        Ok(self
            .state
            .lock()
            .submissions
            .values()
            .rev()
            .filter(|s| s.submitter_id == user_id)
            .cloned()
            .collect())
    }

    async fn create_submission(&self, new_submission: NewSubmission) -> Result<SubmissionData> {
        let mut state = self.state.lock();

        let submission = SubmissionData {
            id: state.next_id(),
            content: new_submission.content,
            submitter_id: new_submission.submitter_id,
            submitter_username: new_submission.submitter_username,
            status: SubmissionStatus::Pending,
            feedback: None,
            created_at: Utc::now(),
        };

        state.submissions.insert(submission.id, submission.clone());
        Ok(submission)
    }

    async fn update_submission(
        &self,
        updated_submission: UpdatedSubmission,
    ) -> Result<SubmissionData> {
        let mut state = self.state.lock();

        let submission = state
            .submissions
            .get_mut(&updated_submission.id)
            .ok_or_else(|| not_found("submission", "id"))?;

        submission.status = updated_submission.status;
        submission.feedback = updated_submission.feedback;

        Ok(submission.clone())
    }

    async fn session_by_code(&self, code: &str) -> Result<SessionData> {
        self.state
            .lock()
            .sessions
            .values()
            .find(|s| s.code == code)
            .cloned()
            .ok_or_else(|| not_found("session", "code"))
    }

    async fn list_sessions(&self) -> Result<Vec<SessionData>> {
        Ok(self.state.lock().sessions.values().cloned().collect())
    }

    async fn create_session(&self, new_session: NewSession) -> Result<SessionData> {
        let mut state = self.state.lock();

        if state.sessions.values().any(|s| s.code == new_session.code) {
            return Err(DatabaseError::Conflict {
                resource: "session",
                field: "code",
                value: new_session.code,
            });
        }

        let session = SessionData {
            id: state.next_id(),
            code: new_session.code,
            participants: new_session.participants,
            active: true,
            scores: vec![],
            preferences: new_session.preferences,
            created_at: Utc::now(),
        };

        state.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn save_session(&self, session: &SessionData) -> Result<SessionData> {
        let mut state = self.state.lock();

        let stored = state
            .sessions
            .get_mut(&session.id)
            .ok_or_else(|| not_found("session", "id"))?;

        stored.participants = session.participants.clone();
        stored.active = session.active;
        stored.scores = session.scores.clone();
        stored.preferences = session.preferences.clone();

        Ok(stored.clone())
    }

    async fn delete_session(&self, code: &str) -> Result<()> {
        let mut state = self.state.lock();

        let id = state
            .sessions
            .values()
            .find(|s| s.code == code)
            .map(|s| s.id)
            .ok_or_else(|| not_found("session", "code"))?;

        state.sessions.remove(&id);
        Ok(())
    }

    async fn friendship_by_id(&self, friendship_id: PrimaryKey) -> Result<FriendshipData> {
        self.state
            .lock()
            .friendships
            .get(&friendship_id)
            .cloned()
            .ok_or_else(|| not_found("friendship", "id"))
    }

    async fn friendship_by_pair(
        &self,
        user1: PrimaryKey,
        user2: PrimaryKey,
    ) -> Result<FriendshipData> {
        self.state
            .lock()
            .friendships
            .values()
            .find(|f| f.user1 == user1 && f.user2 == user2)
            .cloned()
            .ok_or_else(|| not_found("friendship", "user1:user2"))
    }

    async fn friendships_of(&self, user_id: PrimaryKey) -> Result<Vec<FriendshipData>> {
        Ok(self
            .state
            .lock()
            .friendships
            .values()
            .filter(|f| f.involves(user_id))
            .cloned()
            .collect())
    }

    async fn create_friendship(&self, new_friendship: NewFriendship) -> Result<FriendshipData> {
        let mut state = self.state.lock();

        let exists = state
            .friendships
            .values()
            .any(|f| f.user1 == new_friendship.user1 && f.user2 == new_friendship.user2);

        if exists {
            return Err(DatabaseError::Conflict {
                resource: "friendship",
                field: "user1:user2",
                value: format!("{}:{}", new_friendship.user1, new_friendship.user2),
            });
        }

        let friendship = FriendshipData {
            id: state.next_id(),
            user1: new_friendship.user1,
            user2: new_friendship.user2,
            status: FriendshipStatus::Pending,
            created_at: Utc::now(),
        };

        state.friendships.insert(friendship.id, friendship.clone());
        Ok(friendship)
    }

    async fn update_friendship_status(
        &self,
        friendship_id: PrimaryKey,
        status: FriendshipStatus,
    ) -> Result<FriendshipData> {
        let mut state = self.state.lock();

        let friendship = state
            .friendships
            .get_mut(&friendship_id)
            .ok_or_else(|| not_found("friendship", "id"))?;

        friendship.status = status;
        Ok(friendship.clone())
    }

    async fn delete_friendship(&self, friendship_id: PrimaryKey) -> Result<()> {
        self.state
            .lock()
            .friendships
            .remove(&friendship_id)
            .map(|_| ())
            .ok_or_else(|| not_found("friendship", "id"))
    }

    async fn delete_friendships_of(&self, user_id: PrimaryKey) -> Result<()> {
        self.state
            .lock()
            .friendships
            .retain(|_, f| !f.involves(user_id));

        Ok(())
    }

    async fn invitation_by_id(&self, invitation_id: PrimaryKey) -> Result<InvitationData> {
        self.state
            .lock()
            .invitations
            .get(&invitation_id)
            .filter(|i| self.is_live(i))
            .cloned()
            .ok_or_else(|| not_found("invitation", "id"))
    }

    async fn pending_invitation(
        &self,
        sender_id: PrimaryKey,
        recipient_id: PrimaryKey,
        session_code: &str,
    ) -> Result<InvitationData> {
        self.state
            .lock()
            .invitations
            .values()
            .find(|i| {
                i.sender_id == sender_id
                    && i.recipient_id == recipient_id
                    && i.session_code == session_code
                    && i.status == InvitationStatus::Pending
                    && self.is_live(i)
            })
            .cloned()
            .ok_or_else(|| not_found("invitation", "sender:recipient:session"))
    }

    async fn pending_invitations_for(
        &self,
        recipient_id: PrimaryKey,
    ) -> Result<Vec<InvitationData>> {
        Ok(self
            .state
            .lock()
            .invitations
            .values()
            .rev()
            .filter(|i| {
                i.recipient_id == recipient_id
                    && i.status == InvitationStatus::Pending
                    && self.is_live(i)
            })
            .cloned()
            .collect())
    }

    async fn create_invitation(&self, new_invitation: NewInvitation) -> Result<InvitationData> {
        let mut state = self.state.lock();

        let invitation = InvitationData {
            id: state.next_id(),
            sender_id: new_invitation.sender_id,
            recipient_id: new_invitation.recipient_id,
            session_code: new_invitation.session_code,
            sender_username: new_invitation.sender_username,
            recipient_username: new_invitation.recipient_username,
            status: InvitationStatus::Pending,
            created_at: Utc::now(),
        };

        state.invitations.insert(invitation.id, invitation.clone());
        Ok(invitation)
    }

    async fn resolve_invitation(
        &self,
        invitation_id: PrimaryKey,
        status: InvitationStatus,
    ) -> Result<Option<InvitationData>> {
        let mut state = self.state.lock();

        let invitation = state
            .invitations
            .get_mut(&invitation_id)
            .filter(|i| !i.is_expired(self.invitation_ttl))
            .ok_or_else(|| not_found("invitation", "id"))?;

        if invitation.status != InvitationStatus::Pending {
            return Ok(None);
        }

        invitation.status = status;
        Ok(Some(invitation.clone()))
    }

    async fn delete_invitations_of(&self, user_id: PrimaryKey) -> Result<()> {
        self.state
            .lock()
            .invitations
            .retain(|_, i| i.sender_id != user_id && i.recipient_id != user_id);

        Ok(())
    }

    async fn clear_expired_invitations(&self) -> Result<u64> {
        let mut state = self.state.lock();
        let before = state.invitations.len();

        let ttl = self.invitation_ttl;
        state.invitations.retain(|_, i| !i.is_expired(ttl));

        Ok((before - state.invitations.len()) as u64)
    }
}
