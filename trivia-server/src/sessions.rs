use axum::{
    extract::{Path, Query},
    routing::{get, post},
    Json,
};

use crate::{
    errors::{ErrorBody, ServerResult},
    schemas::{
        CreateSessionSchema, JoinSessionSchema, QuestionQuery, SessionActionSchema,
        UpdateScoreSchema, ValidatedJson,
    },
    serialized::{Question, Session, ToSerialized},
    Router, ServerContext,
};

#[utoipa::path(
    post,
    path = "/sessions/create",
    tag = "sessions",
    request_body = CreateSessionSchema,
    responses(
        (status = 200, body = Session)
    )
)]
async fn create_session(
    context: ServerContext,
    ValidatedJson(body): ValidatedJson<CreateSessionSchema>,
) -> ServerResult<Json<Session>> {
    let session = context
        .collab
        .sessions
        .create_session(
            &body.initiator_name,
            body.preferences.map(Into::into).unwrap_or_default(),
        )
        .await?;

    Ok(Json(session.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/sessions/join",
    tag = "sessions",
    request_body = JoinSessionSchema,
    responses(
        (status = 200, body = Session),
        (status = 404, body = ErrorBody)
    )
)]
async fn join_session(
    context: ServerContext,
    ValidatedJson(body): ValidatedJson<JoinSessionSchema>,
) -> ServerResult<Json<Session>> {
    let session = context
        .collab
        .sessions
        .join_session(&body.session_id, body.user_id)
        .await?;

    Ok(Json(session.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/sessions/{code}",
    tag = "sessions",
    params(
        ("code" = String, Path, description = "The session code")
    ),
    responses(
        (status = 200, body = Session),
        (status = 404, body = ErrorBody)
    )
)]
async fn session(context: ServerContext, Path(code): Path<String>) -> ServerResult<Json<Session>> {
    let session = context.collab.sessions.session(&code).await?;

    Ok(Json(session.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/game/start",
    tag = "game",
    request_body = SessionActionSchema,
    responses(
        (status = 200, body = Session),
        (status = 404, body = ErrorBody),
        (status = 409, description = "Session is not active", body = ErrorBody)
    )
)]
async fn start_game(
    context: ServerContext,
    ValidatedJson(body): ValidatedJson<SessionActionSchema>,
) -> ServerResult<Json<Session>> {
    let session = context
        .collab
        .sessions
        .start_session(&body.session_id)
        .await?;

    Ok(Json(session.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/game/end",
    tag = "game",
    request_body = SessionActionSchema,
    responses(
        (status = 200, body = Session),
        (status = 404, body = ErrorBody)
    )
)]
async fn end_game(
    context: ServerContext,
    ValidatedJson(body): ValidatedJson<SessionActionSchema>,
) -> ServerResult<Json<Session>> {
    let session = context
        .collab
        .sessions
        .end_session(&body.session_id)
        .await?;

    Ok(Json(session.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/game/update-score",
    tag = "game",
    request_body = UpdateScoreSchema,
    responses(
        (status = 200, body = Session),
        (status = 404, body = ErrorBody)
    )
)]
async fn update_score(
    context: ServerContext,
    ValidatedJson(body): ValidatedJson<UpdateScoreSchema>,
) -> ServerResult<Json<Session>> {
    let session = context
        .collab
        .sessions
        .update_score(&body.session_id, &body.player_name, body.score)
        .await?;

    Ok(Json(session.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/game/questions",
    tag = "game",
    params(QuestionQuery),
    responses(
        (status = 200, body = Vec<Question>)
    )
)]
async fn questions(
    context: ServerContext,
    Query(query): Query<QuestionQuery>,
) -> ServerResult<Json<Vec<Question>>> {
    let questions = context
        .collab
        .sessions
        .list_questions(&query.into())
        .await?;

    Ok(Json(questions.to_serialized()))
}

pub fn sessions_router() -> Router {
    Router::new()
        .route("/create", post(create_session))
        .route("/join", post(join_session))
        .route("/:code", get(session))
}

pub fn game_router() -> Router {
    Router::new()
        .route("/start", post(start_game))
        .route("/end", post(end_game))
        .route("/update-score", post(update_score))
        .route("/questions", get(questions))
}
