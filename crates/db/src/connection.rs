use std::time::Duration;

use helpdesk_core::config::DatabaseConfig;
use sqlx::sqlite::SqlitePoolOptions;

pub type DbPool = sqlx::SqlitePool;

pub async fn connect_with_config(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(&sqlite_url(&config.url), config.max_connections, config.timeout_secs)
        .await
}

/// Opens a pool with foreign keys on and a busy timeout. A file database is
/// created on first connect so `migrate` works against a fresh path. An
/// in-memory database lives in exactly one connection that is never recycled.
pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    let url = sqlite_url(database_url);
    let in_memory = url.contains(":memory:");
    let url = if in_memory || url.contains("mode=") {
        url
    } else if url.contains('?') {
        format!("{url}&mode=rwc")
    } else {
        format!("{url}?mode=rwc")
    };

    let mut options = SqlitePoolOptions::new();
    options = if in_memory {
        options.max_connections(1).idle_timeout(None).max_lifetime(None)
    } else {
        options.max_connections(max_connections.max(1))
    };

    options
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
                sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect(&url)
        .await
}

fn sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == ":memory:" {
        "sqlite::memory:".to_string()
    } else {
        trimmed.to_string()
    }
}
