use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
    routing::{get, post, put},
    Json,
};
use trivia_collab::{Credentials, UserData};

use crate::{
    errors::{ErrorBody, ServerError, ServerResult},
    schemas::{
        ChangePasswordSchema, LoginSchema, RegisterSchema, UpdateUsernameSchema, ValidatedJson,
    },
    serialized::{AuthResult, Message, ToSerialized, User},
    Router, ServerContext,
};

/// The authenticated user of a request, resolved from its bearer token
pub struct Session {
    pub user: UserData,
}

/// Like [Session], but the user must be an admin
pub struct AdminSession {
    pub user: UserData,
}

/// Returns the token of a `Bearer <token>` authorization header
fn bearer_token(parts: &Parts) -> Result<&str, ServerError> {
    let value = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|x| x.to_str().ok())
        .ok_or_else(|| ServerError::unauthorized("Missing authorization"))?;

    let mut words = value.split_ascii_whitespace();

    match (words.next(), words.next()) {
        (Some("Bearer"), Some(token)) => Ok(token),
        _ => Err(ServerError::unauthorized("Authorization must be Bearer")),
    }
}

#[async_trait]
impl FromRequestParts<ServerContext> for Session {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        let context = ServerContext::from_ref(state);
        let token = bearer_token(parts)?;

        let user = context.collab.auth.authorize(token).await?;

        Ok(Self { user })
    }
}

#[async_trait]
impl FromRequestParts<ServerContext> for AdminSession {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        let Session { user } = Session::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            return Err(ServerError::Forbidden("Admin access required".to_string()));
        }

        Ok(Self { user })
    }
}

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterSchema,
    responses(
        (status = 200, body = AuthResult),
        (status = 409, description = "Username is taken", body = ErrorBody)
    )
)]
async fn register(
    context: ServerContext,
    ValidatedJson(body): ValidatedJson<RegisterSchema>,
) -> ServerResult<Json<AuthResult>> {
    let session = context
        .collab
        .auth
        .register(Credentials {
            username: body.username,
            password: body.password,
        })
        .await?;

    Ok(Json(session.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginSchema,
    responses(
        (status = 200, body = AuthResult),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    )
)]
async fn login(
    context: ServerContext,
    ValidatedJson(body): ValidatedJson<LoginSchema>,
) -> ServerResult<Json<AuthResult>> {
    let session = context
        .collab
        .auth
        .login(Credentials {
            username: body.username,
            password: body.password,
        })
        .await?;

    Ok(Json(session.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/auth/user",
    tag = "auth",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = User),
        (status = 401, body = ErrorBody)
    )
)]
async fn user(session: Session) -> Json<User> {
    Json(session.user.to_serialized())
}

#[utoipa::path(
    put,
    path = "/auth/user",
    tag = "auth",
    request_body = UpdateUsernameSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = User),
        (status = 409, description = "Username is taken", body = ErrorBody)
    )
)]
async fn update_user(
    session: Session,
    context: ServerContext,
    ValidatedJson(body): ValidatedJson<UpdateUsernameSchema>,
) -> ServerResult<Json<User>> {
    let user = context
        .collab
        .auth
        .update_username(session.user.id, body.username)
        .await?;

    Ok(Json(user.to_serialized()))
}

#[utoipa::path(
    put,
    path = "/auth/password",
    tag = "auth",
    request_body = ChangePasswordSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Message),
        (status = 401, description = "Current password is wrong", body = ErrorBody)
    )
)]
async fn change_password(
    session: Session,
    context: ServerContext,
    ValidatedJson(body): ValidatedJson<ChangePasswordSchema>,
) -> ServerResult<Json<Message>> {
    context
        .collab
        .auth
        .change_password(session.user.id, &body.current_password, &body.new_password)
        .await?;

    Ok(Json(Message::new("Password changed")))
}

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/user", get(user).put(update_user))
        .route("/password", put(change_password))
}
