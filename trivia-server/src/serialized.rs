//! All schemas that are exposed from endpoints are defined here
//! along with the conversions from collab types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trivia_collab::{
    AuthSession, Friend as CollabFriend, FriendRequest as CollabFriendRequest, FriendsOverview,
    FriendshipData, InvitationData, QuestionData, Role as CollabRole, ScoreEntry, SessionData,
    SubmissionData, UserData,
};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// A user, never including the password
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: i32,
    username: String,
    role: Role,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResult {
    token: String,
    user: User,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    player_name: String,
    score: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    difficulty: Option<String>,
    category: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    id: i32,
    /// The shareable session code
    session_id: String,
    participants: Vec<String>,
    active: bool,
    scores: Vec<Score>,
    preferences: Preferences,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    id: i32,
    question: String,
    options: Vec<String>,
    answer: String,
    category: Option<String>,
    difficulty: Option<String>,
    image: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    id: i32,
    question: String,
    options: Vec<String>,
    answer: String,
    category: Option<String>,
    difficulty: Option<String>,
    image: Option<String>,
    submitter_id: i32,
    submitter_username: String,
    #[schema(example = "pending")]
    status: String,
    feedback: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovedSubmission {
    submission: Submission,
    question: Question,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Friend {
    friendship_id: i32,
    user_id: i32,
    username: String,
    online: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    request_id: i32,
    user_id: i32,
    username: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Friends {
    friends: Vec<Friend>,
    sent_requests: Vec<FriendRequest>,
    received_requests: Vec<FriendRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Friendship {
    id: i32,
    /// The user that sent the request
    user1: i32,
    /// The user that received the request
    user2: i32,
    #[schema(example = "pending")]
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    id: i32,
    sender_id: i32,
    recipient_id: i32,
    session_id: String,
    sender_username: String,
    recipient_username: String,
    #[schema(example = "pending")]
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedInvitation {
    /// The session to join
    session_id: String,
}

impl AcceptedInvitation {
    pub fn new(session_id: String) -> Self {
        Self { session_id }
    }
}

/// A plain acknowledgement
#[derive(Debug, Serialize, ToSchema)]
pub struct Message {
    message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl From<CollabRole> for Role {
    fn from(value: CollabRole) -> Self {
        match value {
            CollabRole::User => Self::User,
            CollabRole::Admin => Self::Admin,
        }
    }
}

impl From<Role> for CollabRole {
    fn from(value: Role) -> Self {
        match value {
            Role::User => Self::User,
            Role::Admin => Self::Admin,
        }
    }
}

impl ToSerialized<User> for UserData {
    fn to_serialized(&self) -> User {
        User {
            id: self.id,
            username: self.username.clone(),
            role: self.role.into(),
            created_at: self.created_at,
        }
    }
}

impl ToSerialized<AuthResult> for AuthSession {
    fn to_serialized(&self) -> AuthResult {
        AuthResult {
            token: self.token.clone(),
            user: self.user.to_serialized(),
        }
    }
}

impl ToSerialized<Score> for ScoreEntry {
    fn to_serialized(&self) -> Score {
        Score {
            player_name: self.player_name.clone(),
            score: self.score,
        }
    }
}

impl ToSerialized<Session> for SessionData {
    fn to_serialized(&self) -> Session {
        Session {
            id: self.id,
            session_id: self.code.clone(),
            participants: self.participants.clone(),
            active: self.active,
            scores: self.scores.to_serialized(),
            preferences: Preferences {
                difficulty: self.preferences.difficulty.clone(),
                category: self.preferences.category.clone(),
            },
            created_at: self.created_at,
        }
    }
}

impl ToSerialized<Question> for QuestionData {
    fn to_serialized(&self) -> Question {
        let content = self.content.clone();

        Question {
            id: self.id,
            question: content.question,
            options: content.options,
            answer: content.answer,
            category: content.category,
            difficulty: content.difficulty,
            image: content.image,
            created_at: self.created_at,
        }
    }
}

impl ToSerialized<Submission> for SubmissionData {
    fn to_serialized(&self) -> Submission {
        let content = self.content.clone();

        Submission {
            id: self.id,
            question: content.question,
            options: content.options,
            answer: content.answer,
            category: content.category,
            difficulty: content.difficulty,
            image: content.image,
            submitter_id: self.submitter_id,
            submitter_username: self.submitter_username.clone(),
            status: self.status.to_string(),
            feedback: self.feedback.clone(),
            created_at: self.created_at,
        }
    }
}

impl ToSerialized<ApprovedSubmission> for (SubmissionData, QuestionData) {
    fn to_serialized(&self) -> ApprovedSubmission {
        ApprovedSubmission {
            submission: self.0.to_serialized(),
            question: self.1.to_serialized(),
        }
    }
}

impl ToSerialized<Friend> for CollabFriend {
    fn to_serialized(&self) -> Friend {
        Friend {
            friendship_id: self.friendship_id,
            user_id: self.user_id,
            username: self.username.clone(),
            online: self.online,
        }
    }
}

impl ToSerialized<FriendRequest> for CollabFriendRequest {
    fn to_serialized(&self) -> FriendRequest {
        FriendRequest {
            request_id: self.request_id,
            user_id: self.user_id,
            username: self.username.clone(),
            created_at: self.created_at,
        }
    }
}

impl ToSerialized<Friends> for FriendsOverview {
    fn to_serialized(&self) -> Friends {
        Friends {
            friends: self.friends.to_serialized(),
            sent_requests: self.sent_requests.to_serialized(),
            received_requests: self.received_requests.to_serialized(),
        }
    }
}

impl ToSerialized<Friendship> for FriendshipData {
    fn to_serialized(&self) -> Friendship {
        Friendship {
            id: self.id,
            user1: self.user1,
            user2: self.user2,
            status: self.status.to_string(),
            created_at: self.created_at,
        }
    }
}

impl ToSerialized<Invitation> for InvitationData {
    fn to_serialized(&self) -> Invitation {
        Invitation {
            id: self.id,
            sender_id: self.sender_id,
            recipient_id: self.recipient_id,
            session_id: self.session_code.clone(),
            sender_username: self.sender_username.clone(),
            recipient_username: self.recipient_username.clone(),
            status: self.status.to_string(),
            created_at: self.created_at,
        }
    }
}
