use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{
    postgres::PgPoolOptions, query, query_as, types::Json, Error as SqlxError, FromRow, PgPool,
};

use crate::{
    Database, DatabaseError, DatabaseResult, FriendshipData, FriendshipStatus, IntoDatabaseError,
    InvitationData, InvitationStatus, NewFriendship, NewInvitation, NewSession, NewSubmission,
    NewUser, PrimaryKey, QuestionContent, QuestionData, QuestionFilter, Result, ScoreEntry,
    SessionData, SessionPreferences, SubmissionData, SubmissionStatus, UnknownVariant,
    UpdatedQuestion, UpdatedSubmission, UpdatedUser, UserData,
};

/// A postgres database implementation for trivia
pub struct PgDatabase {
    pool: PgPool,
    invitation_ttl: Duration,
}

impl PgDatabase {
    pub async fn new(url: &str, invitation_ttl: Duration) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| e.any())?;

        Ok(Self {
            pool,
            invitation_ttl,
        })
    }

    /// Runs the embedded migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::Internal(Box::new(e)))
    }

    /// Invitations created before this instant are expired
    fn invitation_cutoff(&self) -> DateTime<Utc> {
        Utc::now() - self.invitation_ttl
    }
}

#[derive(FromRow)]
struct UserRow {
    id: i32,
    username: String,
    password: String,
    role: String,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct QuestionRow {
    id: i32,
    question: String,
    options: Vec<String>,
    answer: String,
    category: Option<String>,
    difficulty: Option<String>,
    image: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct SubmissionRow {
    id: i32,
    question: String,
    options: Vec<String>,
    answer: String,
    category: Option<String>,
    difficulty: Option<String>,
    image: Option<String>,
    submitter_id: i32,
    submitter_username: String,
    status: String,
    feedback: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct SessionRow {
    id: i32,
    code: String,
    participants: Vec<String>,
    active: bool,
    scores: Json<Vec<ScoreEntry>>,
    preferences: Json<SessionPreferences>,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct FriendshipRow {
    id: i32,
    user1_id: i32,
    user2_id: i32,
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct InvitationRow {
    id: i32,
    sender_id: i32,
    recipient_id: i32,
    session_code: String,
    sender_username: String,
    recipient_username: String,
    status: String,
    created_at: DateTime<Utc>,
}

fn parse<T>(value: &str) -> Result<T>
where
    T: FromStr<Err = UnknownVariant>,
{
    value
        .parse()
        .map_err(|e: UnknownVariant| DatabaseError::Internal(Box::new(e)))
}

impl TryFrom<UserRow> for UserData {
    type Error = DatabaseError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            role: parse(&row.role)?,
            username: row.username,
            password: row.password,
            created_at: row.created_at,
        })
    }
}

impl From<QuestionRow> for QuestionData {
    fn from(row: QuestionRow) -> Self {
        Self {
            id: row.id,
            content: QuestionContent {
                question: row.question,
                options: row.options,
                answer: row.answer,
                category: row.category,
                difficulty: row.difficulty,
                image: row.image,
            },
            created_at: row.created_at,
        }
    }
}

impl TryFrom<SubmissionRow> for SubmissionData {
    type Error = DatabaseError;

    fn try_from(row: SubmissionRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            status: parse(&row.status)?,
            content: QuestionContent {
                question: row.question,
                options: row.options,
                answer: row.answer,
                category: row.category,
                difficulty: row.difficulty,
                image: row.image,
            },
            submitter_id: row.submitter_id,
            submitter_username: row.submitter_username,
            feedback: row.feedback,
            created_at: row.created_at,
        })
    }
}

impl From<SessionRow> for SessionData {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            participants: row.participants,
            active: row.active,
            scores: row.scores.0,
            preferences: row.preferences.0,
            created_at: row.created_at,
        }
    }
}

impl TryFrom<FriendshipRow> for FriendshipData {
    type Error = DatabaseError;

    fn try_from(row: FriendshipRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            user1: row.user1_id,
            user2: row.user2_id,
            status: parse(&row.status)?,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<InvitationRow> for InvitationData {
    type Error = DatabaseError;

    fn try_from(row: InvitationRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            status: parse(&row.status)?,
            sender_id: row.sender_id,
            recipient_id: row.recipient_id,
            session_code: row.session_code,
            sender_username: row.sender_username,
            recipient_username: row.recipient_username,
            created_at: row.created_at,
        })
    }
}

fn collect<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = DatabaseError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[async_trait]
impl Database for PgDatabase {
    async fn user_by_id(&self, user_id: PrimaryKey) -> Result<UserData> {
        query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("user", "id"))?
            .try_into()
    }

    async fn user_by_username(&self, username: &str) -> Result<UserData> {
        query_as::<_, UserRow>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("user", "username"))?
            .try_into()
    }

    async fn users_by_ids(&self, user_ids: &[PrimaryKey]) -> Result<Vec<UserData>> {
        let rows = query_as::<_, UserRow>("SELECT * FROM users WHERE id = ANY($1)")
            .bind(user_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        collect(rows)
    }

    async fn list_users(&self) -> Result<Vec<UserData>> {
        let rows = query_as::<_, UserRow>("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        collect(rows)
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserData> {
        self.user_by_username(&new_user.username)
            .await
            .conflict_or_ok("user", "username", &new_user.username)?;

        query_as::<_, UserRow>(
            "INSERT INTO users (username, password, role) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&new_user.username)
        .bind(&new_user.password)
        .bind(new_user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.conflict_or("user", "username", &new_user.username))?
        .try_into()
    }

    async fn update_user(&self, updated_user: UpdatedUser) -> Result<UserData> {
        let user = self.user_by_id(updated_user.id).await?;

        if let Some(username) = &updated_user.username {
            if username != &user.username {
                self.user_by_username(username)
                    .await
                    .conflict_or_ok("user", "username", username)?;
            }
        }

        let username = updated_user.username.unwrap_or(user.username);

        query("UPDATE users SET username = $1, password = $2, role = $3 WHERE id = $4")
            .bind(&username)
            .bind(updated_user.password.unwrap_or(user.password))
            .bind(updated_user.role.unwrap_or(user.role).as_str())
            .bind(updated_user.id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.conflict_or("user", "username", &username))?;

        self.user_by_id(updated_user.id).await
    }

    async fn delete_user(&self, user_id: PrimaryKey) -> Result<()> {
        // Ensure user exists
        let _ = self.user_by_id(user_id).await?;

        query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn question_by_id(&self, question_id: PrimaryKey) -> Result<QuestionData> {
        query_as::<_, QuestionRow>("SELECT * FROM questions WHERE id = $1")
            .bind(question_id)
            .fetch_one(&self.pool)
            .await
            .map(Into::into)
            .map_err(|e| e.not_found_or("question", "id"))
    }

    async fn list_questions(&self, filter: &QuestionFilter) -> Result<Vec<QuestionData>> {
        query_as::<_, QuestionRow>(
            "SELECT * FROM questions
            WHERE ($1::TEXT IS NULL OR difficulty = $1)
                AND ($2::TEXT IS NULL OR category = $2)
            ORDER BY id",
        )
        .bind(filter.difficulty())
        .bind(filter.category())
        .fetch_all(&self.pool)
        .await
        .map(|rows| rows.into_iter().map(Into::into).collect())
        .map_err(|e| e.any())
    }

    async fn create_question(&self, new_question: QuestionContent) -> Result<QuestionData> {
        query_as::<_, QuestionRow>(
            "INSERT INTO questions (question, options, answer, category, difficulty, image)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *",
        )
        .bind(new_question.question)
        .bind(new_question.options)
        .bind(new_question.answer)
        .bind(new_question.category)
        .bind(new_question.difficulty)
        .bind(new_question.image)
        .fetch_one(&self.pool)
        .await
        .map(Into::into)
        .map_err(|e| e.any())
    }

    async fn update_question(&self, updated_question: UpdatedQuestion) -> Result<QuestionData> {
        let content = updated_question.content;

        query_as::<_, QuestionRow>(
            "UPDATE questions SET
                question = $1,
                options = $2,
                answer = $3,
                category = $4,
                difficulty = $5,
                image = $6
            WHERE id = $7
            RETURNING *",
        )
        .bind(content.question)
        .bind(content.options)
        .bind(content.answer)
        .bind(content.category)
        .bind(content.difficulty)
        .bind(content.image)
        .bind(updated_question.id)
        .fetch_one(&self.pool)
        .await
        .map(Into::into)
        .map_err(|e| e.not_found_or("question", "id"))
    }

    async fn delete_question(&self, question_id: PrimaryKey) -> Result<()> {
        let result = query("DELETE FROM questions WHERE id = $1")
            .bind(question_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound {
                resource: "question",
                identifier: "id",
            });
        }

        Ok(())
    }

    async fn submission_by_id(&self, submission_id: PrimaryKey) -> Result<SubmissionData> {
        query_as::<_, SubmissionRow>("SELECT * FROM submissions WHERE id = $1")
            .bind(submission_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("submission", "id"))?
            .try_into()
    }

    async fn list_submissions(
        &self,
        status: Option<SubmissionStatus>,
    ) -> Result<Vec<SubmissionData>> {
        let rows = query_as::<_, SubmissionRow>(
            "SELECT * FROM submissions
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC",
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        collect(rows)
    }

    async fn submissions_by_user(&self, user_id: PrimaryKey) -> Result<Vec<SubmissionData>> {
        let rows = query_as::<_, SubmissionRow>(
            "SELECT * FROM submissions WHERE submitter_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        collect(rows)
    }

    async fn create_submission(&self, new_submission: NewSubmission) -> Result<SubmissionData> {
        let content = new_submission.content;

        query_as::<_, SubmissionRow>(
            "INSERT INTO submissions
                (question, options, answer, category, difficulty, image, submitter_id, submitter_username)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *",
        )
        .bind(content.question)
        .bind(content.options)
        .bind(content.answer)
        .bind(content.category)
        .bind(content.difficulty)
        .bind(content.image)
        .bind(new_submission.submitter_id)
        .bind(new_submission.submitter_username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())?
        .try_into()
    }

    async fn update_submission(
        &self,
        updated_submission: UpdatedSubmission,
    ) -> Result<SubmissionData> {
        query_as::<_, SubmissionRow>(
            "UPDATE submissions SET status = $1, feedback = $2 WHERE id = $3 RETURNING *",
        )
        .bind(updated_submission.status.as_str())
        .bind(updated_submission.feedback)
        .bind(updated_submission.id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("submission", "id"))?
        .try_into()
    }

    async fn session_by_code(&self, code: &str) -> Result<SessionData> {
        query_as::<_, SessionRow>("SELECT * FROM sessions WHERE code = $1")
            .bind(code)
            .fetch_one(&self.pool)
            .await
            .map(Into::into)
            .map_err(|e| e.not_found_or("session", "code"))
    }

    async fn list_sessions(&self) -> Result<Vec<SessionData>> {
        query_as::<_, SessionRow>("SELECT * FROM sessions ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map(|rows| rows.into_iter().map(Into::into).collect())
            .map_err(|e| e.any())
    }

    async fn create_session(&self, new_session: NewSession) -> Result<SessionData> {
        self.session_by_code(&new_session.code)
            .await
            .conflict_or_ok("session", "code", &new_session.code)?;

        query_as::<_, SessionRow>(
            "INSERT INTO sessions (code, participants, preferences) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&new_session.code)
        .bind(new_session.participants)
        .bind(Json(new_session.preferences))
        .fetch_one(&self.pool)
        .await
        .map(Into::into)
        .map_err(|e| e.conflict_or("session", "code", &new_session.code))
    }

    async fn save_session(&self, session: &SessionData) -> Result<SessionData> {
        query_as::<_, SessionRow>(
            "UPDATE sessions SET
                participants = $1,
                active = $2,
                scores = $3,
                preferences = $4
            WHERE id = $5
            RETURNING *",
        )
        .bind(&session.participants)
        .bind(session.active)
        .bind(Json(&session.scores))
        .bind(Json(&session.preferences))
        .bind(session.id)
        .fetch_one(&self.pool)
        .await
        .map(Into::into)
        .map_err(|e| e.not_found_or("session", "id"))
    }

    async fn delete_session(&self, code: &str) -> Result<()> {
        // Ensure session exists
        let _ = self.session_by_code(code).await?;

        query("DELETE FROM sessions WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn friendship_by_id(&self, friendship_id: PrimaryKey) -> Result<FriendshipData> {
        query_as::<_, FriendshipRow>("SELECT * FROM friendships WHERE id = $1")
            .bind(friendship_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("friendship", "id"))?
            .try_into()
    }

    async fn friendship_by_pair(
        &self,
        user1: PrimaryKey,
        user2: PrimaryKey,
    ) -> Result<FriendshipData> {
        query_as::<_, FriendshipRow>(
            "SELECT * FROM friendships WHERE user1_id = $1 AND user2_id = $2",
        )
        .bind(user1)
        .bind(user2)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("friendship", "user1:user2"))?
        .try_into()
    }

    async fn friendships_of(&self, user_id: PrimaryKey) -> Result<Vec<FriendshipData>> {
        let rows = query_as::<_, FriendshipRow>(
            "SELECT * FROM friendships WHERE user1_id = $1 OR user2_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        collect(rows)
    }

    async fn create_friendship(&self, new_friendship: NewFriendship) -> Result<FriendshipData> {
        self.friendship_by_pair(new_friendship.user1, new_friendship.user2)
            .await
            .conflict_or_ok(
                "friendship",
                "user1:user2",
                format!("{}:{}", new_friendship.user1, new_friendship.user2).as_str(),
            )?;

        query_as::<_, FriendshipRow>(
            "INSERT INTO friendships (user1_id, user2_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(new_friendship.user1)
        .bind(new_friendship.user2)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            e.conflict_or(
                "friendship",
                "user1:user2",
                &format!("{}:{}", new_friendship.user1, new_friendship.user2),
            )
        })?
        .try_into()
    }

    async fn update_friendship_status(
        &self,
        friendship_id: PrimaryKey,
        status: FriendshipStatus,
    ) -> Result<FriendshipData> {
        query_as::<_, FriendshipRow>(
            "UPDATE friendships SET status = $1 WHERE id = $2 RETURNING *",
        )
        .bind(status.as_str())
        .bind(friendship_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("friendship", "id"))?
        .try_into()
    }

    async fn delete_friendship(&self, friendship_id: PrimaryKey) -> Result<()> {
        // Ensure friendship exists
        let _ = self.friendship_by_id(friendship_id).await?;

        query("DELETE FROM friendships WHERE id = $1")
            .bind(friendship_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn delete_friendships_of(&self, user_id: PrimaryKey) -> Result<()> {
        query("DELETE FROM friendships WHERE user1_id = $1 OR user2_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn invitation_by_id(&self, invitation_id: PrimaryKey) -> Result<InvitationData> {
        query_as::<_, InvitationRow>(
            "SELECT * FROM game_invitations WHERE id = $1 AND created_at > $2",
        )
        .bind(invitation_id)
        .bind(self.invitation_cutoff())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("invitation", "id"))?
        .try_into()
    }

    async fn pending_invitation(
        &self,
        sender_id: PrimaryKey,
        recipient_id: PrimaryKey,
        session_code: &str,
    ) -> Result<InvitationData> {
        query_as::<_, InvitationRow>(
            "SELECT * FROM game_invitations
            WHERE sender_id = $1
                AND recipient_id = $2
                AND session_code = $3
                AND status = 'pending'
                AND created_at > $4
            LIMIT 1",
        )
        .bind(sender_id)
        .bind(recipient_id)
        .bind(session_code)
        .bind(self.invitation_cutoff())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("invitation", "sender:recipient:session"))?
        .try_into()
    }

    async fn pending_invitations_for(
        &self,
        recipient_id: PrimaryKey,
    ) -> Result<Vec<InvitationData>> {
        let rows = query_as::<_, InvitationRow>(
            "SELECT * FROM game_invitations
            WHERE recipient_id = $1 AND status = 'pending' AND created_at > $2
            ORDER BY created_at DESC, id DESC",
        )
        .bind(recipient_id)
        .bind(self.invitation_cutoff())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        collect(rows)
    }

    async fn create_invitation(&self, new_invitation: NewInvitation) -> Result<InvitationData> {
        query_as::<_, InvitationRow>(
            "INSERT INTO game_invitations
                (sender_id, recipient_id, session_code, sender_username, recipient_username)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *",
        )
        .bind(new_invitation.sender_id)
        .bind(new_invitation.recipient_id)
        .bind(new_invitation.session_code)
        .bind(new_invitation.sender_username)
        .bind(new_invitation.recipient_username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())?
        .try_into()
    }

    async fn resolve_invitation(
        &self,
        invitation_id: PrimaryKey,
        status: InvitationStatus,
    ) -> Result<Option<InvitationData>> {
        let row = query_as::<_, InvitationRow>(
            "UPDATE game_invitations SET status = $1
            WHERE id = $2 AND created_at > $3 AND status = $4
            RETURNING *",
        )
        .bind(status.as_str())
        .bind(invitation_id)
        .bind(self.invitation_cutoff())
        .bind(InvitationStatus::Pending.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| e.any())?;

        match row {
            Some(row) => row.try_into().map(Some),
            // Either it was resolved already or it is gone, the lookup tells which
            None => self.invitation_by_id(invitation_id).await.map(|_| None),
        }
    }

    async fn delete_invitations_of(&self, user_id: PrimaryKey) -> Result<()> {
        query("DELETE FROM game_invitations WHERE sender_id = $1 OR recipient_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn clear_expired_invitations(&self) -> Result<u64> {
        query("DELETE FROM game_invitations WHERE created_at <= $1")
            .bind(self.invitation_cutoff())
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|r| r.rows_affected())
    }
}

impl IntoDatabaseError for SqlxError {
    fn any(self) -> DatabaseError {
        DatabaseError::Internal(Box::new(self))
    }

    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError {
        match self {
            SqlxError::RowNotFound => DatabaseError::NotFound {
                resource,
                identifier,
            },
            e => Self::any(e),
        }
    }

    fn conflict_or(self, resource: &'static str, field: &'static str, value: &str) -> DatabaseError {
        match self {
            SqlxError::Database(e) if e.is_unique_violation() => DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            },
            e => Self::any(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{borrow::Cow, error::Error as StdError, fmt};

    use sqlx::error::{DatabaseError as SqlxDatabaseError, ErrorKind};

    use super::*;

    #[derive(Debug)]
    struct DuplicateKey;

    impl fmt::Display for DuplicateKey {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("duplicate key value violates unique constraint")
        }
    }

    impl StdError for DuplicateKey {}

    impl SqlxDatabaseError for DuplicateKey {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed("23505"))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn test_unique_violation_is_a_conflict() {
        let error = SqlxError::Database(Box::new(DuplicateKey));

        assert!(matches!(
            error.conflict_or("user", "username", "alice"),
            DatabaseError::Conflict { value, .. } if value == "alice"
        ));
    }

    #[test]
    fn test_other_errors_stay_internal() {
        assert!(matches!(
            SqlxError::PoolTimedOut.conflict_or("user", "username", "alice"),
            DatabaseError::Internal(_)
        ));
    }
}
