use std::net::{Ipv6Addr, SocketAddr};

use axum::routing::get;
use log::info;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use trivia_collab::env_or;

mod admin;
mod auth;
mod context;
mod docs;
mod errors;
mod friends;
mod invitations;
mod realtime;
mod schemas;
mod serialized;
mod sessions;
mod submissions;

pub use context::ServerContext;
pub use errors::{ServerError, ServerResult};

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 9050;

pub type Router = axum::Router<ServerContext>;

/// Builds the full application router
pub fn app(context: ServerContext) -> axum::Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/auth", auth::router())
        .nest("/sessions", sessions::sessions_router())
        .nest("/game", sessions::game_router())
        .nest("/friends", friends::router())
        .nest("/game-invitations", invitations::router())
        .nest("/questions", submissions::router())
        .nest("/admin", admin::router())
        .nest("/socket", realtime::router())
        .route("/api.json", get(docs::docs))
        .layer(cors)
        .with_state(context)
}

/// Starts the trivia server
pub async fn run_server(context: ServerContext) -> Result<(), std::io::Error> {
    let port = env_or("TRIVIA_SERVER_PORT", DEFAULT_PORT);
    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, port).into();

    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on port {}", port);

    axum::serve(listener, app(context).into_make_service()).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use trivia_collab::{Collab, Config, MemoryDatabase};

    use super::*;

    fn context() -> ServerContext {
        let config = Config {
            token_secret: "test-secret".to_string(),
            ..Default::default()
        };

        ServerContext::new(Collab::new(Arc::new(MemoryDatabase::default()), config))
    }

    async fn request(
        context: &ServerContext,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request builds");

        let response = app(context.clone())
            .oneshot(request)
            .await
            .expect("request is handled");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body is read");

        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register(context: &ServerContext, username: &str) -> (String, i64) {
        let (status, body) = request(
            context,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "username": username, "password": "hunter22" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK, "registration succeeds: {}", body);

        let token = body["token"].as_str().expect("token is returned").to_string();
        let id = body["user"]["id"].as_i64().expect("user id is returned");

        (token, id)
    }

    #[tokio::test]
    async fn test_register_then_fetch_user() {
        let context = context();
        let (token, _) = register(&context, "alice").await;

        let (status, body) = request(&context, Method::GET, "/auth/user", Some(&token), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");
        assert_eq!(body["role"], "user");
        assert!(body.get("password").is_none(), "password is never exposed");
    }

    #[tokio::test]
    async fn test_login_failures_look_alike() {
        let context = context();
        register(&context, "alice").await;

        let (wrong_password, first) = request(
            &context,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "nope" })),
        )
        .await;

        let (unknown_user, second) = request(
            &context,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "username": "nobody", "password": "nope" })),
        )
        .await;

        assert_eq!(wrong_password, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_user, StatusCode::UNAUTHORIZED);
        assert_eq!(first, second, "both failures have the same body");
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let context = context();

        let (status, body) = request(&context, Method::GET, "/friends", None, None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string(), "error body is returned");
    }

    #[tokio::test]
    async fn test_admin_routes_require_admin() {
        let context = context();
        let (token, _) = register(&context, "alice").await;

        let (status, _) = request(&context, Method::GET, "/admin/users", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        context
            .collab
            .auth
            .ensure_admin("root".to_string(), "rootpass")
            .await
            .expect("admin is created");

        let (_, login) = request(
            &context,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "username": "root", "password": "rootpass" })),
        )
        .await;

        let admin_token = login["token"].as_str().expect("admin logs in");

        let (status, users) =
            request(&context, Method::GET, "/admin/users", Some(admin_token), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(users.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_session_flow() {
        let context = context();
        let (_, user_id) = register(&context, "bob").await;

        let (status, session) = request(
            &context,
            Method::POST,
            "/sessions/create",
            None,
            Some(json!({ "initiatorName": "alice" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let code = session["sessionId"].as_str().expect("code is returned");
        assert_eq!(code.len(), 6);

        let (status, joined) = request(
            &context,
            Method::POST,
            "/sessions/join",
            None,
            Some(json!({ "sessionId": code, "userId": user_id })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            joined["participants"],
            json!(["alice", user_id.to_string()]),
            "participants are recorded by user id"
        );

        let (status, scored) = request(
            &context,
            Method::POST,
            "/game/update-score",
            None,
            Some(json!({ "sessionId": code, "playerName": "bob", "score": 5 })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(scored["scores"], json!([{ "playerName": "bob", "score": 5 }]));

        let (status, ended) = request(
            &context,
            Method::POST,
            "/game/end",
            None,
            Some(json!({ "sessionId": code })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(ended["active"], false);

        let (status, _) = request(
            &context,
            Method::POST,
            "/game/start",
            None,
            Some(json!({ "sessionId": code })),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT, "ended sessions cannot start");
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let context = context();

        let (status, body) = request(&context, Method::GET, "/sessions/ZZZZZZ", None, None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_invalid_body_is_bad_request() {
        let context = context();

        let (status, _) = request(
            &context,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "username": "a", "password": "hunter22" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "username is too short");
    }

    #[tokio::test]
    async fn test_submission_moderation() {
        let context = context();
        let (token, _) = register(&context, "alice").await;

        let (status, submission) = request(
            &context,
            Method::POST,
            "/questions/submit",
            Some(&token),
            Some(json!({
                "question": "Largest planet?",
                "options": ["Jupiter", "Mars"],
                "answer": "Jupiter"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(submission["status"], "pending");

        let (status, _) = request(
            &context,
            Method::POST,
            "/questions/submit",
            Some(&token),
            Some(json!({
                "question": "Largest planet?",
                "options": ["Jupiter", "Mars"],
                "answer": "Saturn"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "answer must be an option");

        let (status, mine) = request(
            &context,
            Method::GET,
            "/questions/my-submissions",
            Some(&token),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(mine.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_friend_request_routes() {
        let context = context();
        let (alice, _) = register(&context, "alice").await;
        let (bob, _) = register(&context, "bob").await;
        let (carol, _) = register(&context, "carol").await;

        let invite = |token: String, username: &'static str| {
            let context = context.clone();
            async move {
                request(
                    &context,
                    Method::POST,
                    "/friends/invite",
                    Some(&token),
                    Some(json!({ "username": username })),
                )
                .await
            }
        };

        let (status, sent) = invite(alice.clone(), "bob").await;
        assert_eq!(status, StatusCode::OK, "request is sent: {}", sent);
        assert_eq!(sent["status"], "pending");
        let request_id = sent["id"].as_i64().expect("request id is returned");

        let accept = format!("/friends/accept/{}", request_id);

        let (status, _) = request(&context, Method::PUT, &accept, Some(&alice), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "sender can't accept");

        let (status, accepted) = request(&context, Method::PUT, &accept, Some(&bob), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(accepted["status"], "accepted");

        let (status, _) = invite(bob.clone(), "alice").await;
        assert_eq!(status, StatusCode::CONFLICT, "already friends");

        let (status, listed) = request(&context, Method::GET, "/friends", Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["friends"].as_array().map(Vec::len), Some(1));

        let (_, pending) = invite(carol.clone(), "bob").await;
        let decline = format!(
            "/friends/decline/{}",
            pending["id"].as_i64().expect("request id is returned")
        );

        let (status, _) = request(&context, Method::DELETE, &decline, Some(&alice), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "outsiders can't decline");

        let (status, _) = request(&context, Method::DELETE, &decline, Some(&bob), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, listed) = request(&context, Method::GET, "/friends", Some(&bob), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            listed["receivedRequests"].as_array().map(Vec::len),
            Some(0),
            "declined request is gone"
        );

        let remove = format!("/friends/remove/{}", request_id);
        let (status, _) = request(&context, Method::DELETE, &remove, Some(&bob), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_game_invitation_routes() {
        let context = context();
        let (alice, _) = register(&context, "alice").await;
        let (bob, bob_id) = register(&context, "bob").await;
        let (carol, _) = register(&context, "carol").await;

        let (status, sent) = request(
            &context,
            Method::POST,
            "/game-invitations",
            Some(&alice),
            Some(json!({ "recipientId": bob_id, "sessionId": "ABC234" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK, "invitation is sent: {}", sent);
        assert_eq!(sent["sessionId"], "ABC234");
        let invitation_id = sent["id"].as_i64().expect("invitation id is returned");

        let (status, listed) =
            request(&context, Method::GET, "/game-invitations", Some(&bob), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().map(Vec::len), Some(1));

        let accept = format!("/game-invitations/accept/{}", invitation_id);
        let decline = format!("/game-invitations/decline/{}", invitation_id);

        let (status, _) = request(&context, Method::PUT, &accept, Some(&carol), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "only the recipient responds");

        let (status, accepted) = request(&context, Method::PUT, &accept, Some(&bob), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(accepted["sessionId"], "ABC234");

        let (status, _) = request(&context, Method::PUT, &decline, Some(&bob), None).await;
        assert_eq!(status, StatusCode::CONFLICT, "answered invitations stay answered");

        let (_, listed) = request(&context, Method::GET, "/game-invitations", Some(&bob), None).await;
        assert_eq!(listed.as_array().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn test_api_document_is_served() {
        let context = context();

        let (status, body) = request(&context, Method::GET, "/api.json", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/auth/login"].is_object());
        assert!(body["components"]["securitySchemes"]["BearerAuth"].is_object());
    }
}
