use log::info;

use crate::{
    content::validate_question, CollabContext, CollabResult, NewSubmission, QuestionContent,
    SubmissionData, UserData,
};

/// Lets users suggest questions for review
pub struct SubmissionManager {
    context: CollabContext,
}

impl SubmissionManager {
    pub fn new(context: &CollabContext) -> Self {
        Self {
            context: context.clone(),
        }
    }

    pub async fn submit(
        &self,
        user: &UserData,
        content: QuestionContent,
    ) -> CollabResult<SubmissionData> {
        let submission = self
            .context
            .database
            .create_submission(NewSubmission {
                content: validate_question(content)?,
                submitter_id: user.id,
                submitter_username: user.username.clone(),
            })
            .await?;

        info!(
            "User {} submitted question {}",
            user.username, submission.id
        );

        Ok(submission)
    }

    /// Lists the submissions of a user, newest first
    pub async fn my_submissions(&self, user: &UserData) -> CollabResult<Vec<SubmissionData>> {
        Ok(self.context.database.submissions_by_user(user.id).await?)
    }
}

#[cfg(test)]
mod tests {
    use crate::{test_util::*, CollabError, SubmissionStatus};

    use super::*;

    #[tokio::test]
    async fn test_submit_and_list() {
        let collab = collab();
        let alice = user(&collab, "alice").await;
        let bob = user(&collab, "bob").await;

        let first = collab
            .submissions
            .submit(&alice, question("first"))
            .await
            .unwrap();
        let second = collab
            .submissions
            .submit(&alice, question("second"))
            .await
            .unwrap();

        assert_eq!(first.status, SubmissionStatus::Pending);
        assert_eq!(first.submitter_username, "alice");

        let mine = collab.submissions.my_submissions(&alice).await.unwrap();
        assert_eq!(
            mine.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![second.id, first.id],
            "newest first"
        );

        assert!(collab
            .submissions
            .my_submissions(&bob)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_invalid_submission_is_rejected() {
        let collab = collab();
        let alice = user(&collab, "alice").await;

        let mut content = question("broken");
        content.answer = "not an option".to_string();

        assert!(matches!(
            collab.submissions.submit(&alice, content).await,
            Err(CollabError::Validation(_))
        ));
    }
}
