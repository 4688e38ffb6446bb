use log::info;

use crate::{
    auth::hash_password, content::validate_question, CollabContext, CollabError, CollabResult,
    NewUser, PrimaryKey, QuestionContent, QuestionData, QuestionFilter, Role, SessionData,
    SubmissionData, SubmissionStatus, UpdatedQuestion, UpdatedSubmission, UpdatedUser, UserData,
};

/// Privileged management of questions, users, sessions and submissions.
///
/// Callers are expected to have checked that the acting user is an admin.
pub struct Admin {
    context: CollabContext,
}

/// Feedback attached to a rejected submission when the admin gives none
pub const DEFAULT_REJECTION_FEEDBACK: &str =
    "Your question did not meet our submission guidelines.";

#[derive(Debug)]
pub struct NewAccount {
    pub username: String,
    /// Plain text, hashed before it's stored
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Default)]
pub struct AccountChanges {
    pub username: Option<String>,
    /// Plain text, hashed before it's stored
    pub password: Option<String>,
    pub role: Option<Role>,
}

impl Admin {
    pub fn new(context: &CollabContext) -> Self {
        Self {
            context: context.clone(),
        }
    }

    pub async fn list_questions(&self) -> CollabResult<Vec<QuestionData>> {
        Ok(self
            .context
            .database
            .list_questions(&QuestionFilter::default())
            .await?)
    }

    pub async fn create_question(&self, content: QuestionContent) -> CollabResult<QuestionData> {
        let question = self
            .context
            .database
            .create_question(validate_question(content)?)
            .await?;

        info!("Question {} created", question.id);
        Ok(question)
    }

    pub async fn update_question(
        &self,
        question_id: PrimaryKey,
        content: QuestionContent,
    ) -> CollabResult<QuestionData> {
        Ok(self
            .context
            .database
            .update_question(UpdatedQuestion {
                id: question_id,
                content: validate_question(content)?,
            })
            .await?)
    }

    pub async fn delete_question(&self, question_id: PrimaryKey) -> CollabResult<()> {
        self.context.database.delete_question(question_id).await?;

        info!("Question {} deleted", question_id);
        Ok(())
    }

    pub async fn list_users(&self) -> CollabResult<Vec<UserData>> {
        Ok(self.context.database.list_users().await?)
    }

    pub async fn create_user(&self, account: NewAccount) -> CollabResult<UserData> {
        let user = self
            .context
            .database
            .create_user(NewUser {
                username: account.username,
                password: hash(&account.password)?,
                role: account.role,
            })
            .await?;

        info!("Admin created user {} with role {}", user.username, user.role);
        Ok(user)
    }

    pub async fn update_user(
        &self,
        user_id: PrimaryKey,
        changes: AccountChanges,
    ) -> CollabResult<UserData> {
        let password = changes.password.as_deref().map(hash).transpose()?;

        Ok(self
            .context
            .database
            .update_user(UpdatedUser {
                id: user_id,
                username: changes.username,
                password,
                role: changes.role,
            })
            .await?)
    }

    /// Deletes a user along with their friendships and invitations
    pub async fn delete_user(&self, user_id: PrimaryKey) -> CollabResult<()> {
        let user = self.context.database.user_by_id(user_id).await?;

        self.context.database.delete_friendships_of(user_id).await?;
        self.context.database.delete_invitations_of(user_id).await?;
        self.context.database.delete_user(user_id).await?;

        info!("User {} deleted", user.username);
        Ok(())
    }

    pub async fn list_sessions(&self) -> CollabResult<Vec<SessionData>> {
        Ok(self.context.database.list_sessions().await?)
    }

    pub async fn delete_session(&self, code: &str) -> CollabResult<()> {
        self.context.database.delete_session(code).await?;

        info!("Session {} deleted", code);
        Ok(())
    }

    pub async fn list_submissions(
        &self,
        status: Option<SubmissionStatus>,
    ) -> CollabResult<Vec<SubmissionData>> {
        Ok(self.context.database.list_submissions(status).await?)
    }

    /// Turns a pending submission into a question. The submission is kept, marked approved.
    pub async fn approve_submission(
        &self,
        submission_id: PrimaryKey,
    ) -> CollabResult<(SubmissionData, QuestionData)> {
        let submission = self.pending_submission(submission_id).await?;

        let question = self
            .context
            .database
            .create_question(submission.content)
            .await?;

        let submission = self
            .context
            .database
            .update_submission(UpdatedSubmission {
                id: submission_id,
                status: SubmissionStatus::Approved,
                feedback: submission.feedback,
            })
            .await?;

        info!(
            "Submission {} approved as question {}",
            submission_id, question.id
        );

        Ok((submission, question))
    }

    pub async fn reject_submission(
        &self,
        submission_id: PrimaryKey,
        feedback: Option<String>,
    ) -> CollabResult<SubmissionData> {
        self.pending_submission(submission_id).await?;

        let feedback = feedback
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| DEFAULT_REJECTION_FEEDBACK.to_string());

        let submission = self
            .context
            .database
            .update_submission(UpdatedSubmission {
                id: submission_id,
                status: SubmissionStatus::Rejected,
                feedback: Some(feedback),
            })
            .await?;

        info!("Submission {} rejected", submission_id);
        Ok(submission)
    }

    async fn pending_submission(&self, submission_id: PrimaryKey) -> CollabResult<SubmissionData> {
        let submission = self
            .context
            .database
            .submission_by_id(submission_id)
            .await?;

        if submission.status != SubmissionStatus::Pending {
            return Err(CollabError::invalid_state(format!(
                "Submission is already {}",
                submission.status
            )));
        }

        Ok(submission)
    }
}

fn hash(password: &str) -> CollabResult<String> {
    hash_password(password).map_err(|e| CollabError::Dependency(Box::new(e)))
}
