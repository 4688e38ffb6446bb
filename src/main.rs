use std::{sync::Arc, time::Duration};

use colored::Colorize;
use log::{error, info, warn};
use thiserror::Error;
use tokio::runtime::{self, Runtime};
use trivia_collab::{
    ArcedDatabase, AuthError, Collab, Config, DatabaseError, MemoryDatabase, PgDatabase,
};
use trivia_server::ServerContext;

use crate::logging::LogColor;

mod logging;

/// How often expired game invitations are swept
const INVITATION_PURGE_INTERVAL: Duration = Duration::from_secs(60);

struct Trivia {
    context: ServerContext,
    runtime: Runtime,
}

#[derive(Debug, Error)]
enum TriviaError {
    #[error("Could not initialize database: {0}")]
    Database(#[from] DatabaseError),

    #[error("Could not create the admin account: {0}")]
    Admin(#[from] AuthError),

    #[error("Server stopped: {0}")]
    Server(std::io::Error),

    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl Trivia {
    fn new() -> Result<Self, TriviaError> {
        info!("Building async runtime...");
        let runtime = runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("trivia-async")
            .build()
            .map_err(|e| TriviaError::Fatal(e.to_string()))?;

        let config = Config::from_env();
        let database = runtime.block_on(connect(&config))?;
        let admin = config.admin.clone();

        let collab = Collab::new(database, config);

        if let Some(seed) = admin {
            runtime.block_on(collab.auth.ensure_admin(seed.username, &seed.password))?;
        }

        Ok(Self {
            context: ServerContext::new(collab),
            runtime,
        })
    }

    fn run(&self) -> Result<(), TriviaError> {
        self.runtime.block_on(async move {
            tokio::spawn(purge_invitations(self.context.collab.clone()));

            trivia_server::run_server(self.context.clone())
                .await
                .map_err(TriviaError::Server)
        })
    }
}

impl TriviaError {
    fn hint(&self) -> String {
        match self {
            TriviaError::Database(_) => "This is a database error. Make sure TRIVIA_DATABASE_URL points to a running PostgreSQL instance, or unset it to use the in-memory store.".to_string(),
            TriviaError::Admin(_) => "Check TRIVIA_ADMIN_USERNAME and TRIVIA_ADMIN_PASSWORD.".to_string(),
            TriviaError::Server(_) => "Make sure TRIVIA_SERVER_PORT is free.".to_string(),
            TriviaError::Fatal(_) => "This error is fatal, and should not happen.".to_string(),
        }
    }
}

async fn connect(config: &Config) -> Result<ArcedDatabase, TriviaError> {
    match &config.database_url {
        Some(url) => {
            info!("Connecting to database...");
            let database = PgDatabase::new(url, config.invitation_ttl).await?;
            database.migrate().await?;

            Ok(Arc::new(database))
        }
        None => {
            warn!("TRIVIA_DATABASE_URL is not set, data will only be kept in memory");
            Ok(Arc::new(MemoryDatabase::new(config.invitation_ttl)))
        }
    }
}

async fn purge_invitations(collab: Arc<Collab>) {
    let mut interval = tokio::time::interval(INVITATION_PURGE_INTERVAL);

    loop {
        interval.tick().await;

        match collab.invitations.purge_expired().await {
            Ok(0) => {}
            Ok(count) => info!("Purged {} expired invitations", count),
            Err(err) => warn!("Failed to purge expired invitations: {}", err),
        }
    }
}

fn main() {
    if let Err(err) = logging::init_logger() {
        eprintln!("Could not initialize logging: {}", err);
    }

    let result = Trivia::new().and_then(|trivia| {
        info!("Initialized successfully.");
        trivia.run()
    });

    if let Err(error) = result {
        error!(
            "{} Read the error below to troubleshoot the issue.",
            "trivia failed to start!".bold().color(LogColor::Red)
        );
        error!("{}", error);
        error!(
            "{}",
            format!("Hint: {}", error.hint())
                .color(LogColor::Dimmed)
                .italic()
        );
    }
}
