use axum::{
    extract::Path,
    routing::{delete, get, post, put},
    Json,
};

use crate::{
    auth::Session,
    errors::{ErrorBody, ServerResult},
    schemas::{FriendInviteSchema, ValidatedJson},
    serialized::{Friends, Friendship, Message, ToSerialized},
    Router, ServerContext,
};

#[utoipa::path(
    get,
    path = "/friends",
    tag = "friends",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Friends)
    )
)]
async fn list_friends(session: Session, context: ServerContext) -> ServerResult<Json<Friends>> {
    let overview = context.collab.social.list_friends(&session.user).await?;

    Ok(Json(overview.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/friends/invite",
    tag = "friends",
    request_body = FriendInviteSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Friendship),
        (status = 400, description = "Cannot befriend yourself", body = ErrorBody),
        (status = 404, description = "No user with that username", body = ErrorBody),
        (status = 409, description = "Already friends or already requested", body = ErrorBody)
    )
)]
async fn invite(
    session: Session,
    context: ServerContext,
    ValidatedJson(body): ValidatedJson<FriendInviteSchema>,
) -> ServerResult<Json<Friendship>> {
    let request = context
        .collab
        .social
        .invite(&session.user, &body.username)
        .await?;

    Ok(Json(request.to_serialized()))
}

#[utoipa::path(
    put,
    path = "/friends/accept/{id}",
    tag = "friends",
    params(
        ("id" = i32, Path, description = "The friend request id")
    ),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Friendship),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
async fn accept(
    session: Session,
    context: ServerContext,
    Path(id): Path<i32>,
) -> ServerResult<Json<Friendship>> {
    let friendship = context.collab.social.accept(&session.user, id).await?;

    Ok(Json(friendship.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/friends/decline/{id}",
    tag = "friends",
    params(
        ("id" = i32, Path, description = "The friend request id")
    ),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Message),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
async fn decline(
    session: Session,
    context: ServerContext,
    Path(id): Path<i32>,
) -> ServerResult<Json<Message>> {
    context.collab.social.decline(&session.user, id).await?;

    Ok(Json(Message::new("Friend request removed")))
}

#[utoipa::path(
    delete,
    path = "/friends/remove/{id}",
    tag = "friends",
    params(
        ("id" = i32, Path, description = "The friendship id")
    ),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Message),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
async fn remove(
    session: Session,
    context: ServerContext,
    Path(id): Path<i32>,
) -> ServerResult<Json<Message>> {
    context.collab.social.remove(&session.user, id).await?;

    Ok(Json(Message::new("Friend removed")))
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_friends))
        .route("/invite", post(invite))
        .route("/accept/:id", put(accept))
        .route("/decline/:id", delete(decline))
        .route("/remove/:id", delete(remove))
}
