//! Async database connection pool.
//!
//! bb8 pool manager over diesel_async PostgreSQL connections.

use std::time::Duration;

use diesel_async::pooled_connection::bb8::Pool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::config::DatabaseConfig;
use crate::error::AppError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Async connection pool type alias.
///
/// bb8::Pool is internally reference-counted, so cloning is cheap and
/// structures holding the pool can derive Clone without extra Arc wrapping.
pub type AsyncDbPool = Pool<AsyncPgConnection>;

/// Creates the connection pool from configuration and optionally runs
/// pending migrations.
pub async fn establish_async_connection_pool(
    config: &DatabaseConfig,
) -> Result<AsyncDbPool, AppError> {
    if config.url.is_empty() {
        return Err(AppError::Configuration {
            key: "database.url".to_string(),
            source: anyhow::anyhow!("database URL is not configured"),
        });
    }

    let database_url = config.url.clone();
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url.clone());

    let pool = Pool::builder()
        .max_size(config.max_connections)
        .min_idle(Some(config.min_connections))
        .connection_timeout(Duration::from_secs(config.connection_timeout))
        .build(manager)
        .await
        .map_err(|e| AppError::ConnectionPool {
            source: anyhow::Error::from(e),
        })?;

    if config.auto_migrate {
        run_migrations(&database_url).await?;
    }

    Ok(pool)
}

/// Runs pending embedded migrations over a blocking diesel connection.
///
/// Migrations use the synchronous harness, so the work is pushed onto the
/// blocking thread pool.
pub async fn run_migrations(database_url: &str) -> Result<Vec<String>, AppError> {
    let database_url = database_url.to_string();

    let applied = tokio::task::spawn_blocking(move || {
        use diesel::pg::PgConnection;
        use diesel::Connection;

        let mut conn = PgConnection::establish(&database_url).map_err(|e| AppError::Database {
            operation: "connect for migrations".to_string(),
            source: anyhow::Error::from(e),
        })?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| AppError::Database {
                operation: "run migrations".to_string(),
                source: anyhow::anyhow!(e.to_string()),
            })?;
        Ok::<_, AppError>(applied.iter().map(|m| m.to_string()).collect::<Vec<_>>())
    })
    .await
    .map_err(|e| AppError::Internal {
        source: anyhow::Error::from(e),
    })??;

    if applied.is_empty() {
        tracing::info!("Database migrations completed: no pending migrations");
    } else {
        tracing::info!(
            count = applied.len(),
            migrations = ?applied,
            "Database migrations completed successfully"
        );
    }

    Ok(applied)
}
