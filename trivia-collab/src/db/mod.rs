use async_trait::async_trait;
use thiserror::Error;

mod data;
pub use data::*;

mod memory;
pub use memory::*;

mod pg;
pub use pg::*;

pub type Result<T> = std::result::Result<T, DatabaseError>;
pub type ArcedDatabase = std::sync::Arc<dyn Database>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An unknown or internal error happened with the database
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A resource already exists
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The resource in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A resource in the database doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
}

/// Helper trait to reduce boilerplate
pub trait IntoDatabaseError {
    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError;
    /// Turns a unique constraint violation into a conflict
    fn conflict_or(self, resource: &'static str, field: &'static str, value: &str)
        -> DatabaseError;
    fn any(self) -> DatabaseError;
}

/// Helper trait to reduce boilerplate
pub trait DatabaseResult<T> {
    /// Turns the Result into a conflict error if it's Ok()
    fn conflict_or_ok(self, resource: &'static str, field: &'static str, value: &str)
        -> Result<()>;

    /// Turns a not found error into [None]
    fn optional(self) -> Result<Option<T>>;
}

impl<T> DatabaseResult<T> for Result<T> {
    fn conflict_or_ok(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> Result<()> {
        match self {
            Ok(_) => Err(DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            }),
            Err(e) => match e {
                DatabaseError::NotFound {
                    resource: _,
                    identifier: _,
                } => Ok(()),
                e => Err(e),
            },
        }
    }

    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(DatabaseError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Represents a keyed document store holding all trivia data.
///
/// Every write is a single atomic document operation, there are no
/// transactions spanning multiple calls.
#[async_trait]
pub trait Database: Send + Sync {
    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData>;
    async fn user_by_username(&self, username: &str) -> Result<UserData>;
    /// Returns the users that exist among `user_ids`, missing ids are skipped
    async fn users_by_ids(&self, user_ids: &[PrimaryKey]) -> Result<Vec<UserData>>;
    async fn list_users(&self) -> Result<Vec<UserData>>;
    async fn create_user(&self, new_user: NewUser) -> Result<UserData>;
    async fn update_user(&self, updated_user: UpdatedUser) -> Result<UserData>;
    async fn delete_user(&self, user_id: PrimaryKey) -> Result<()>;

    async fn question_by_id(&self, question_id: PrimaryKey) -> Result<QuestionData>;
    async fn list_questions(&self, filter: &QuestionFilter) -> Result<Vec<QuestionData>>;
    async fn create_question(&self, new_question: QuestionContent) -> Result<QuestionData>;
    async fn update_question(&self, updated_question: UpdatedQuestion) -> Result<QuestionData>;
    async fn delete_question(&self, question_id: PrimaryKey) -> Result<()>;

    async fn submission_by_id(&self, submission_id: PrimaryKey) -> Result<SubmissionData>;
    async fn list_submissions(&self, status: Option<SubmissionStatus>)
        -> Result<Vec<SubmissionData>>;
    async fn submissions_by_user(&self, user_id: PrimaryKey) -> Result<Vec<SubmissionData>>;
    async fn create_submission(&self, new_submission: NewSubmission) -> Result<SubmissionData>;
    async fn update_submission(
        &self,
        updated_submission: UpdatedSubmission,
    ) -> Result<SubmissionData>;

    async fn session_by_code(&self, code: &str) -> Result<SessionData>;
    async fn list_sessions(&self) -> Result<Vec<SessionData>>;
    async fn create_session(&self, new_session: NewSession) -> Result<SessionData>;
    /// Overwrites the stored session document, last write wins
    async fn save_session(&self, session: &SessionData) -> Result<SessionData>;
    async fn delete_session(&self, code: &str) -> Result<()>;

    async fn friendship_by_id(&self, friendship_id: PrimaryKey) -> Result<FriendshipData>;
    /// Finds the edge for the exact ordered pair
    async fn friendship_by_pair(&self, user1: PrimaryKey, user2: PrimaryKey)
        -> Result<FriendshipData>;
    async fn friendships_of(&self, user_id: PrimaryKey) -> Result<Vec<FriendshipData>>;
    async fn create_friendship(&self, new_friendship: NewFriendship) -> Result<FriendshipData>;
    async fn update_friendship_status(
        &self,
        friendship_id: PrimaryKey,
        status: FriendshipStatus,
    ) -> Result<FriendshipData>;
    async fn delete_friendship(&self, friendship_id: PrimaryKey) -> Result<()>;
    async fn delete_friendships_of(&self, user_id: PrimaryKey) -> Result<()>;

    /// Expired invitations are treated as if they don't exist
    async fn invitation_by_id(&self, invitation_id: PrimaryKey) -> Result<InvitationData>;
    async fn pending_invitation(
        &self,
        sender_id: PrimaryKey,
        recipient_id: PrimaryKey,
        session_code: &str,
    ) -> Result<InvitationData>;
    async fn pending_invitations_for(&self, recipient_id: PrimaryKey)
        -> Result<Vec<InvitationData>>;
    async fn create_invitation(&self, new_invitation: NewInvitation) -> Result<InvitationData>;
    /// Moves a pending invitation to `status`, returning `None` if it was already resolved
    async fn resolve_invitation(
        &self,
        invitation_id: PrimaryKey,
        status: InvitationStatus,
    ) -> Result<Option<InvitationData>>;
    async fn delete_invitations_of(&self, user_id: PrimaryKey) -> Result<()>;
    /// Removes invitations older than the time-to-live, returning how many were removed
    async fn clear_expired_invitations(&self) -> Result<u64>;
}

#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    /// Already hashed
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Default)]
pub struct UpdatedUser {
    pub id: PrimaryKey,
    pub username: Option<String>,
    /// Already hashed
    pub password: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug)]
pub struct UpdatedQuestion {
    pub id: PrimaryKey,
    pub content: QuestionContent,
}

#[derive(Debug)]
pub struct NewSubmission {
    pub content: QuestionContent,
    pub submitter_id: PrimaryKey,
    pub submitter_username: String,
}

#[derive(Debug)]
pub struct UpdatedSubmission {
    pub id: PrimaryKey,
    pub status: SubmissionStatus,
    pub feedback: Option<String>,
}

#[derive(Debug)]
pub struct NewSession {
    pub code: String,
    pub participants: Vec<String>,
    pub preferences: SessionPreferences,
}

#[derive(Debug)]
pub struct NewFriendship {
    /// The user sending the request
    pub user1: PrimaryKey,
    /// The user receiving the request
    pub user2: PrimaryKey,
}

#[derive(Debug)]
pub struct NewInvitation {
    pub sender_id: PrimaryKey,
    pub recipient_id: PrimaryKey,
    pub session_code: String,
    pub sender_username: String,
    pub recipient_username: String,
}
