use axum::{
    extract::Path,
    routing::{get, put},
    Json,
};

use crate::{
    auth::Session,
    errors::{ErrorBody, ServerResult},
    schemas::{SendInvitationSchema, ValidatedJson},
    serialized::{AcceptedInvitation, Invitation, ToSerialized},
    Router, ServerContext,
};

#[utoipa::path(
    get,
    path = "/game-invitations",
    tag = "game-invitations",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, description = "Pending invitations, newest first", body = Vec<Invitation>)
    )
)]
async fn list_invitations(
    session: Session,
    context: ServerContext,
) -> ServerResult<Json<Vec<Invitation>>> {
    let invitations = context.collab.invitations.list(&session.user).await?;

    Ok(Json(invitations.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/game-invitations",
    tag = "game-invitations",
    request_body = SendInvitationSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Invitation),
        (status = 404, description = "Recipient doesn't exist", body = ErrorBody)
    )
)]
async fn send_invitation(
    session: Session,
    context: ServerContext,
    ValidatedJson(body): ValidatedJson<SendInvitationSchema>,
) -> ServerResult<Json<Invitation>> {
    let invitation = context
        .collab
        .invitations
        .send(&session.user, body.recipient_id, body.session_id)
        .await?;

    Ok(Json(invitation.to_serialized()))
}

#[utoipa::path(
    put,
    path = "/game-invitations/accept/{id}",
    tag = "game-invitations",
    params(
        ("id" = i32, Path, description = "The invitation id")
    ),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = AcceptedInvitation),
        (status = 403, body = ErrorBody),
        (status = 404, description = "Missing or expired", body = ErrorBody),
        (status = 409, description = "Already responded to", body = ErrorBody)
    )
)]
async fn accept_invitation(
    session: Session,
    context: ServerContext,
    Path(id): Path<i32>,
) -> ServerResult<Json<AcceptedInvitation>> {
    let session_code = context
        .collab
        .invitations
        .accept(&session.user, id)
        .await?;

    Ok(Json(AcceptedInvitation::new(session_code)))
}

#[utoipa::path(
    put,
    path = "/game-invitations/decline/{id}",
    tag = "game-invitations",
    params(
        ("id" = i32, Path, description = "The invitation id")
    ),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Invitation),
        (status = 403, body = ErrorBody),
        (status = 404, description = "Missing or expired", body = ErrorBody),
        (status = 409, description = "Already responded to", body = ErrorBody)
    )
)]
async fn decline_invitation(
    session: Session,
    context: ServerContext,
    Path(id): Path<i32>,
) -> ServerResult<Json<Invitation>> {
    let invitation = context
        .collab
        .invitations
        .decline(&session.user, id)
        .await?;

    Ok(Json(invitation.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_invitations).post(send_invitation))
        .route("/accept/:id", put(accept_invitation))
        .route("/decline/:id", put(decline_invitation))
}
