use std::sync::Arc;

use crate::{Collab, Config, MemoryDatabase, NewUser, QuestionContent, Role, UserData};

pub fn collab() -> Collab {
    collab_with_database().0
}

/// Returns the collab along with its database, for tests that need to tamper with it
pub fn collab_with_database() -> (Collab, Arc<MemoryDatabase>) {
    let config = Config {
        token_secret: "test-secret".to_string(),
        ..Default::default()
    };
    let database = Arc::new(MemoryDatabase::new(config.invitation_ttl));

    (Collab::new(database.clone(), config), database)
}

/// Creates a user directly in the database, skipping password hashing
pub async fn user(collab: &Collab, username: &str) -> UserData {
    collab
        .context
        .database
        .create_user(NewUser {
            username: username.to_string(),
            password: "unusable".to_string(),
            role: Role::User,
        })
        .await
        .expect("user is created")
}

pub fn question(text: &str) -> QuestionContent {
    QuestionContent {
        question: text.to_string(),
        options: vec!["Jupiter".to_string(), "Oslo".to_string()],
        answer: "Jupiter".to_string(),
        category: Some("general".to_string()),
        difficulty: Some("easy".to_string()),
        image: None,
    }
}
