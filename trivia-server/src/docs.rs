use std::borrow::BorrowMut;

use axum::{response::IntoResponse, Json};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::{errors, schemas, serialized};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::auth::register,
        crate::auth::login,
        crate::auth::user,
        crate::auth::update_user,
        crate::auth::change_password,
        crate::sessions::create_session,
        crate::sessions::join_session,
        crate::sessions::session,
        crate::sessions::start_game,
        crate::sessions::end_game,
        crate::sessions::update_score,
        crate::sessions::questions,
        crate::friends::list_friends,
        crate::friends::invite,
        crate::friends::accept,
        crate::friends::decline,
        crate::friends::remove,
        crate::invitations::list_invitations,
        crate::invitations::send_invitation,
        crate::invitations::accept_invitation,
        crate::invitations::decline_invitation,
        crate::submissions::submit,
        crate::submissions::my_submissions,
        crate::admin::list_questions,
        crate::admin::create_question,
        crate::admin::update_question,
        crate::admin::delete_question,
        crate::admin::list_users,
        crate::admin::create_user,
        crate::admin::update_user,
        crate::admin::delete_user,
        crate::admin::list_sessions,
        crate::admin::delete_session,
        crate::admin::list_submissions,
        crate::admin::approve_submission,
        crate::admin::reject_submission,
        crate::realtime::socket,
    ),
    components(schemas(
        errors::ErrorBody,
        schemas::LoginSchema,
        schemas::RegisterSchema,
        schemas::UpdateUsernameSchema,
        schemas::ChangePasswordSchema,
        schemas::PreferencesSchema,
        schemas::CreateSessionSchema,
        schemas::JoinSessionSchema,
        schemas::SessionActionSchema,
        schemas::UpdateScoreSchema,
        schemas::FriendInviteSchema,
        schemas::SendInvitationSchema,
        schemas::QuestionSchema,
        schemas::NewUserSchema,
        schemas::UpdateUserSchema,
        schemas::RejectSubmissionSchema,
        schemas::SubmissionStatusParam,
        serialized::Role,
        serialized::User,
        serialized::AuthResult,
        serialized::Score,
        serialized::Preferences,
        serialized::Session,
        serialized::Question,
        serialized::Submission,
        serialized::ApprovedSubmission,
        serialized::Friend,
        serialized::FriendRequest,
        serialized::Friends,
        serialized::Friendship,
        serialized::Invitation,
        serialized::AcceptedInvitation,
        serialized::Message,
    )),
    modifiers(&Security),
    info(
        title = "trivia API",
        description = "trivia-server exposes endpoints to play, manage and moderate trivia sessions"
    )
)]
pub struct ApiDoc;

struct Security;

impl Modify for Security {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.borrow_mut() {
            let scheme = HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .bearer_format("Bearer <token>")
                .build();

            components.add_security_scheme("BearerAuth", SecurityScheme::Http(scheme))
        }
    }
}

pub async fn docs() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
