use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use trivia_collab::{QuestionContent, QuestionFilter, SessionPreferences, SubmissionStatus};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{errors::ServerError, serialized::Role};

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginSchema {
    #[validate(length(min = 1, max = 128))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterSchema {
    #[validate(length(min = 2, max = 32))]
    pub username: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateUsernameSchema {
    #[validate(length(min = 2, max = 32))]
    pub username: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChangePasswordSchema {
    #[validate(length(min = 1, max = 128))]
    pub current_password: String,
    #[validate(length(min = 6, max = 128))]
    pub new_password: String,
}

#[derive(Debug, Clone, Default, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PreferencesSchema {
    #[validate(length(max = 64))]
    pub difficulty: Option<String>,
    #[validate(length(max = 64))]
    pub category: Option<String>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateSessionSchema {
    /// The name of the player creating the session
    #[serde(alias = "username")]
    #[validate(length(min = 1, max = 64))]
    pub initiator_name: String,
    pub preferences: Option<PreferencesSchema>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JoinSessionSchema {
    #[validate(length(min = 1, max = 64))]
    pub session_id: String,
    pub user_id: i32,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SessionActionSchema {
    #[validate(length(min = 1, max = 64))]
    pub session_id: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateScoreSchema {
    #[validate(length(min = 1, max = 64))]
    pub session_id: String,
    #[validate(length(min = 1, max = 64))]
    pub player_name: String,
    #[serde(alias = "playerScore")]
    pub score: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QuestionQuery {
    /// A difficulty, or "all"
    pub difficulty: Option<String>,
    /// A category, or "all"
    pub category: Option<String>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FriendInviteSchema {
    #[validate(length(min = 1, max = 32))]
    pub username: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SendInvitationSchema {
    pub recipient_id: i32,
    /// The session to invite to, a new one is created if absent
    #[validate(length(max = 64))]
    pub session_id: Option<String>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QuestionSchema {
    #[validate(length(min = 1, max = 512))]
    pub question: String,
    #[validate(length(min = 2, max = 8))]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 256))]
    pub answer: String,
    #[validate(length(max = 64))]
    pub category: Option<String>,
    #[validate(length(max = 64))]
    pub difficulty: Option<String>,
    #[validate(length(max = 2048))]
    pub image: Option<String>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewUserSchema {
    #[validate(length(min = 2, max = 32))]
    pub username: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    pub role: Option<Role>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateUserSchema {
    #[validate(length(min = 2, max = 32))]
    pub username: Option<String>,
    #[validate(length(min = 6, max = 128))]
    pub password: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Default, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RejectSubmissionSchema {
    #[validate(length(max = 1024))]
    pub feedback: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SubmissionQuery {
    /// Only list submissions with this status
    #[param(inline)]
    pub status: Option<SubmissionStatusParam>,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatusParam {
    Pending,
    Approved,
    Rejected,
}

impl From<SubmissionStatusParam> for SubmissionStatus {
    fn from(value: SubmissionStatusParam) -> Self {
        match value {
            SubmissionStatusParam::Pending => Self::Pending,
            SubmissionStatusParam::Approved => Self::Approved,
            SubmissionStatusParam::Rejected => Self::Rejected,
        }
    }
}

impl From<PreferencesSchema> for SessionPreferences {
    fn from(value: PreferencesSchema) -> Self {
        Self {
            difficulty: value.difficulty,
            category: value.category,
        }
    }
}

impl From<QuestionQuery> for QuestionFilter {
    fn from(value: QuestionQuery) -> Self {
        Self {
            difficulty: value.difficulty,
            category: value.category,
        }
    }
}

impl From<QuestionSchema> for QuestionContent {
    fn from(value: QuestionSchema) -> Self {
        Self {
            question: value.question,
            options: value.options,
            answer: value.answer,
            category: value.category,
            difficulty: value.difficulty,
            image: value.image,
        }
    }
}

/// Extracts a JSON body and validates it
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ServerError::BadRequest(e.body_text()))?;

        body.validate()
            .map_err(|e| ServerError::BadRequest(e.to_string()))?;

        Ok(Self(body))
    }
}
