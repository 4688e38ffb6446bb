use axum::{
    extract::{Path, Query},
    routing::{delete, get, put},
    Json,
};
use log::info;
use trivia_collab::{AccountChanges, NewAccount};

use crate::{
    auth::AdminSession,
    errors::{ErrorBody, ServerResult},
    schemas::{
        NewUserSchema, QuestionSchema, RejectSubmissionSchema, SubmissionQuery, UpdateUserSchema,
        ValidatedJson,
    },
    serialized::{
        ApprovedSubmission, Message, Question, Session, Submission, ToSerialized, User,
    },
    Router, ServerContext,
};

#[utoipa::path(
    get,
    path = "/admin/questions",
    tag = "admin",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Question>),
        (status = 403, body = ErrorBody)
    )
)]
async fn list_questions(
    _session: AdminSession,
    context: ServerContext,
) -> ServerResult<Json<Vec<Question>>> {
    let questions = context.collab.admin.list_questions().await?;

    Ok(Json(questions.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/admin/questions",
    tag = "admin",
    request_body = QuestionSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Question),
        (status = 400, body = ErrorBody)
    )
)]
async fn create_question(
    _session: AdminSession,
    context: ServerContext,
    ValidatedJson(body): ValidatedJson<QuestionSchema>,
) -> ServerResult<Json<Question>> {
    let question = context.collab.admin.create_question(body.into()).await?;

    Ok(Json(question.to_serialized()))
}

#[utoipa::path(
    put,
    path = "/admin/questions/{id}",
    tag = "admin",
    request_body = QuestionSchema,
    params(
        ("id" = i32, Path, description = "The question id")
    ),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Question),
        (status = 400, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
async fn update_question(
    _session: AdminSession,
    context: ServerContext,
    Path(id): Path<i32>,
    ValidatedJson(body): ValidatedJson<QuestionSchema>,
) -> ServerResult<Json<Question>> {
    let question = context
        .collab
        .admin
        .update_question(id, body.into())
        .await?;

    Ok(Json(question.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/admin/questions/{id}",
    tag = "admin",
    params(
        ("id" = i32, Path, description = "The question id")
    ),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Message),
        (status = 404, body = ErrorBody)
    )
)]
async fn delete_question(
    _session: AdminSession,
    context: ServerContext,
    Path(id): Path<i32>,
) -> ServerResult<Json<Message>> {
    context.collab.admin.delete_question(id).await?;

    Ok(Json(Message::new("Question deleted")))
}

#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<User>)
    )
)]
async fn list_users(
    _session: AdminSession,
    context: ServerContext,
) -> ServerResult<Json<Vec<User>>> {
    let users = context.collab.admin.list_users().await?;

    Ok(Json(users.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/admin/users",
    tag = "admin",
    request_body = NewUserSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = User),
        (status = 409, body = ErrorBody)
    )
)]
async fn create_user(
    _session: AdminSession,
    context: ServerContext,
    ValidatedJson(body): ValidatedJson<NewUserSchema>,
) -> ServerResult<Json<User>> {
    let user = context
        .collab
        .admin
        .create_user(NewAccount {
            username: body.username,
            password: body.password,
            role: body.role.map(Into::into).unwrap_or_default(),
        })
        .await?;

    Ok(Json(user.to_serialized()))
}

#[utoipa::path(
    put,
    path = "/admin/users/{id}",
    tag = "admin",
    request_body = UpdateUserSchema,
    params(
        ("id" = i32, Path, description = "The user id")
    ),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = User),
        (status = 404, body = ErrorBody),
        (status = 409, body = ErrorBody)
    )
)]
async fn update_user(
    _session: AdminSession,
    context: ServerContext,
    Path(id): Path<i32>,
    ValidatedJson(body): ValidatedJson<UpdateUserSchema>,
) -> ServerResult<Json<User>> {
    let user = context
        .collab
        .admin
        .update_user(
            id,
            AccountChanges {
                username: body.username,
                password: body.password,
                role: body.role.map(Into::into),
            },
        )
        .await?;

    Ok(Json(user.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    tag = "admin",
    params(
        ("id" = i32, Path, description = "The user id")
    ),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Message),
        (status = 404, body = ErrorBody)
    )
)]
async fn delete_user(
    session: AdminSession,
    context: ServerContext,
    Path(id): Path<i32>,
) -> ServerResult<Json<Message>> {
    context.collab.admin.delete_user(id).await?;

    info!("Admin {} deleted user {}", session.user.username, id);
    Ok(Json(Message::new("User deleted")))
}

#[utoipa::path(
    get,
    path = "/admin/sessions",
    tag = "admin",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Session>)
    )
)]
async fn list_sessions(
    _session: AdminSession,
    context: ServerContext,
) -> ServerResult<Json<Vec<Session>>> {
    let sessions = context.collab.admin.list_sessions().await?;

    Ok(Json(sessions.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/admin/sessions/{code}",
    tag = "admin",
    params(
        ("code" = String, Path, description = "The session code")
    ),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Message),
        (status = 404, body = ErrorBody)
    )
)]
async fn delete_session(
    _session: AdminSession,
    context: ServerContext,
    Path(code): Path<String>,
) -> ServerResult<Json<Message>> {
    context.collab.admin.delete_session(&code).await?;

    Ok(Json(Message::new("Session deleted")))
}

#[utoipa::path(
    get,
    path = "/admin/submissions",
    tag = "admin",
    params(SubmissionQuery),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "Submissions, newest first", body = Vec<Submission>)
    )
)]
async fn list_submissions(
    _session: AdminSession,
    context: ServerContext,
    Query(query): Query<SubmissionQuery>,
) -> ServerResult<Json<Vec<Submission>>> {
    let submissions = context
        .collab
        .admin
        .list_submissions(query.status.map(Into::into))
        .await?;

    Ok(Json(submissions.to_serialized()))
}

#[utoipa::path(
    put,
    path = "/admin/submissions/{id}/approve",
    tag = "admin",
    params(
        ("id" = i32, Path, description = "The submission id")
    ),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = ApprovedSubmission),
        (status = 404, body = ErrorBody),
        (status = 409, description = "Already moderated", body = ErrorBody)
    )
)]
async fn approve_submission(
    _session: AdminSession,
    context: ServerContext,
    Path(id): Path<i32>,
) -> ServerResult<Json<ApprovedSubmission>> {
    let approved = context.collab.admin.approve_submission(id).await?;

    Ok(Json(approved.to_serialized()))
}

#[utoipa::path(
    put,
    path = "/admin/submissions/{id}/reject",
    tag = "admin",
    request_body = RejectSubmissionSchema,
    params(
        ("id" = i32, Path, description = "The submission id")
    ),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Submission),
        (status = 404, body = ErrorBody),
        (status = 409, description = "Already moderated", body = ErrorBody)
    )
)]
async fn reject_submission(
    _session: AdminSession,
    context: ServerContext,
    Path(id): Path<i32>,
    body: Option<ValidatedJson<RejectSubmissionSchema>>,
) -> ServerResult<Json<Submission>> {
    let feedback = body.and_then(|ValidatedJson(body)| body.feedback);

    let submission = context
        .collab
        .admin
        .reject_submission(id, feedback)
        .await?;

    Ok(Json(submission.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/questions", get(list_questions).post(create_question))
        .route(
            "/questions/:id",
            put(update_question).delete(delete_question),
        )
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", put(update_user).delete(delete_user))
        .route("/sessions", get(list_sessions))
        .route("/sessions/:code", delete(delete_session))
        .route("/submissions", get(list_submissions))
        .route("/submissions/:id/approve", put(approve_submission))
        .route("/submissions/:id/reject", put(reject_submission))
}
