use argon2::{
    password_hash::{Encoding, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use log::info;
use rand::rngs::OsRng;
use thiserror::Error;

use crate::{
    token::TokenSigner, CollabContext, DatabaseError, NewUser, PrimaryKey, Role, UpdatedUser,
    UserData,
};

pub struct Auth {
    context: CollabContext,
    tokens: TokenSigner,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Password is incorrect
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// No account has the given username
    #[error("User not found")]
    UserNotFound,
    /// The token is missing, malformed, expired, or its user is gone
    #[error("Invalid token")]
    InvalidToken,
    #[error("Username {0} is already taken")]
    UsernameTaken(String),
    /// Something else went wrong with the database
    #[error(transparent)]
    Db(DatabaseError),
    #[error("HashError: {0}")]
    HashError(String),
}

/// The result of a successful registration or login
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user: UserData,
}

#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Auth {
    pub fn new(context: &CollabContext) -> Self {
        Self {
            context: context.clone(),
            tokens: TokenSigner::new(&context.config.token_secret, context.config.token_ttl),
        }
    }

    /// Creates a regular user and logs them in
    pub async fn register(&self, credentials: Credentials) -> Result<AuthSession, AuthError> {
        let user = self
            .create_user(credentials.username, &credentials.password, Role::User)
            .await?;

        info!("User {} registered", user.username);
        Ok(self.session_for(user))
    }

    /// Logs in a user, returning a new token
    pub async fn login(&self, credentials: Credentials) -> Result<AuthSession, AuthError> {
        let user = self
            .context
            .database
            .user_by_username(&credentials.username)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound { .. } => AuthError::UserNotFound,
                err => AuthError::Db(err),
            })?;

        verify_password(&credentials.password, &user.password)?;

        Ok(self.session_for(user))
    }

    /// Resolves a bearer token to the user it was issued to
    pub async fn authorize(&self, token: &str) -> Result<UserData, AuthError> {
        let claims = self
            .tokens
            .verify(token)
            .map_err(|_| AuthError::InvalidToken)?;

        self.context
            .database
            .user_by_id(claims.sub)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound { .. } => AuthError::InvalidToken,
                err => AuthError::Db(err),
            })
    }

    /// Changes the password of a user after checking the current one
    pub async fn change_password(
        &self,
        user_id: PrimaryKey,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user = self
            .context
            .database
            .user_by_id(user_id)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound { .. } => AuthError::UserNotFound,
                err => AuthError::Db(err),
            })?;

        verify_password(current_password, &user.password)?;

        self.context
            .database
            .update_user(UpdatedUser {
                id: user_id,
                password: Some(hash_password(new_password)?),
                ..Default::default()
            })
            .await
            .map_err(AuthError::Db)?;

        info!("User {} changed their password", user.username);
        Ok(())
    }

    /// Renames a user
    pub async fn update_username(
        &self,
        user_id: PrimaryKey,
        username: String,
    ) -> Result<UserData, AuthError> {
        self.context
            .database
            .update_user(UpdatedUser {
                id: user_id,
                username: Some(username),
                ..Default::default()
            })
            .await
            .map_err(|e| match e {
                DatabaseError::Conflict { value, .. } => AuthError::UsernameTaken(value),
                DatabaseError::NotFound { .. } => AuthError::UserNotFound,
                err => AuthError::Db(err),
            })
    }

    /// Creates an admin account unless a user with that username already exists
    pub async fn ensure_admin(
        &self,
        username: String,
        password: &str,
    ) -> Result<Option<UserData>, AuthError> {
        match self.context.database.user_by_username(&username).await {
            Ok(_) => Ok(None),
            Err(DatabaseError::NotFound { .. }) => {
                let user = self.create_user(username, password, Role::Admin).await?;

                info!("Created admin account {}", user.username);
                Ok(Some(user))
            }
            Err(e) => Err(AuthError::Db(e)),
        }
    }

    fn session_for(&self, user: UserData) -> AuthSession {
        AuthSession {
            token: self.tokens.issue(user.id, user.role),
            user,
        }
    }

    async fn create_user(
        &self,
        username: String,
        password: &str,
        role: Role,
    ) -> Result<UserData, AuthError> {
        self.context
            .database
            .create_user(NewUser {
                username,
                password: hash_password(password)?,
                role,
            })
            .await
            .map_err(|e| match e {
                DatabaseError::Conflict { value, .. } => AuthError::UsernameTaken(value),
                err => AuthError::Db(err),
            })
    }
}

/// Hashes a password with argon2 and a random salt
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::HashError(e.to_string()))
}

fn verify_password(password: &str, stored: &str) -> Result<(), AuthError> {
    let stored_password = PasswordHash::parse(stored, Encoding::default())
        .map_err(|e| AuthError::HashError(e.to_string()))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &stored_password)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use crate::test_util::collab;

    use super::*;

    fn credentials(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let collab = collab();

        let registered = collab
            .auth
            .register(credentials("alice", "hunter22"))
            .await
            .expect("registers");

        assert_eq!(registered.user.role, Role::User, "new users are regular users");
        assert_ne!(
            registered.user.password, "hunter22",
            "password is stored hashed"
        );

        let logged_in = collab
            .auth
            .login(credentials("alice", "hunter22"))
            .await
            .expect("logs in");

        let user = collab
            .auth
            .authorize(&logged_in.token)
            .await
            .expect("token resolves");

        assert_eq!(user.id, registered.user.id);
    }

    #[tokio::test]
    async fn test_register_conflict() {
        let collab = collab();

        collab
            .auth
            .register(credentials("alice", "hunter22"))
            .await
            .unwrap();

        let result = collab.auth.register(credentials("alice", "other")).await;

        assert!(matches!(result, Err(AuthError::UsernameTaken(_))));
    }

    #[tokio::test]
    async fn test_login_failures() {
        let collab = collab();

        collab
            .auth
            .register(credentials("alice", "hunter22"))
            .await
            .unwrap();

        assert!(matches!(
            collab.auth.login(credentials("bob", "hunter22")).await,
            Err(AuthError::UserNotFound)
        ));
        assert!(matches!(
            collab.auth.login(credentials("alice", "wrong")).await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_authorize_rejects_deleted_user() {
        let collab = collab();

        let session = collab
            .auth
            .register(credentials("alice", "hunter22"))
            .await
            .unwrap();

        collab
            .context
            .database
            .delete_user(session.user.id)
            .await
            .unwrap();

        assert!(matches!(
            collab.auth.authorize(&session.token).await,
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            collab.auth.authorize("nonsense").await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_change_password() {
        let collab = collab();

        let session = collab
            .auth
            .register(credentials("alice", "hunter22"))
            .await
            .unwrap();

        assert!(matches!(
            collab
                .auth
                .change_password(session.user.id, "wrong", "new-password")
                .await,
            Err(AuthError::InvalidCredentials)
        ));

        collab
            .auth
            .change_password(session.user.id, "hunter22", "new-password")
            .await
            .expect("password changes");

        assert!(collab
            .auth
            .login(credentials("alice", "new-password"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let collab = collab();

        let created = collab
            .auth
            .ensure_admin("root".to_string(), "password")
            .await
            .unwrap();

        assert!(created.map_or(false, |u| u.is_admin()), "admin is created");

        let again = collab
            .auth
            .ensure_admin("root".to_string(), "password")
            .await
            .unwrap();

        assert!(again.is_none(), "existing account is left alone");
    }

    #[tokio::test]
    async fn test_update_username_conflict() {
        let collab = collab();

        let alice = collab
            .auth
            .register(credentials("alice", "hunter22"))
            .await
            .unwrap();
        collab
            .auth
            .register(credentials("bob", "hunter22"))
            .await
            .unwrap();

        assert!(matches!(
            collab
                .auth
                .update_username(alice.user.id, "bob".to_string())
                .await,
            Err(AuthError::UsernameTaken(_))
        ));

        let renamed = collab
            .auth
            .update_username(alice.user.id, "alicia".to_string())
            .await
            .unwrap();

        assert_eq!(renamed.username, "alicia");
    }
}
