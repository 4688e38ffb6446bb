use axum::{
    routing::{get, post},
    Json,
};

use crate::{
    auth::Session,
    errors::{ErrorBody, ServerResult},
    schemas::{QuestionSchema, ValidatedJson},
    serialized::{Submission, ToSerialized},
    Router, ServerContext,
};

#[utoipa::path(
    post,
    path = "/questions/submit",
    tag = "questions",
    request_body = QuestionSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Submission),
        (status = 400, description = "The answer is not one of the options", body = ErrorBody)
    )
)]
async fn submit(
    session: Session,
    context: ServerContext,
    ValidatedJson(body): ValidatedJson<QuestionSchema>,
) -> ServerResult<Json<Submission>> {
    let submission = context
        .collab
        .submissions
        .submit(&session.user, body.into())
        .await?;

    Ok(Json(submission.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/questions/my-submissions",
    tag = "questions",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Submission>)
    )
)]
async fn my_submissions(
    session: Session,
    context: ServerContext,
) -> ServerResult<Json<Vec<Submission>>> {
    let submissions = context
        .collab
        .submissions
        .my_submissions(&session.user)
        .await?;

    Ok(Json(submissions.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/submit", post(submit))
        .route("/my-submissions", get(my_submissions))
}
