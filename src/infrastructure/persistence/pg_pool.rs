use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, instrument, warn};

use crate::application::ports::RepositoryError;
use crate::config::DatabaseSettings;

/// Connects to the session database and brings its schema up to date.
///
/// The first connection is retried `connect_retries` times, doubling the
/// delay from `retry_base_delay_ms` after each failure.
#[instrument(skip_all, fields(max_connections = settings.max_connections))]
pub async fn create_pool(settings: &DatabaseSettings) -> Result<PgPool, RepositoryError> {
    let pool = connect_with_backoff(settings).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

async fn connect_with_backoff(settings: &DatabaseSettings) -> Result<PgPool, RepositoryError> {
    let options = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs));
    let mut delay = Duration::from_millis(settings.retry_base_delay_ms);
    let mut attempt = 0;

    loop {
        match options.clone().connect(&settings.url).await {
            Ok(pool) => {
                info!(attempt, "session database reachable");
                return Ok(pool);
            }
            Err(e) if attempt < settings.connect_retries => {
                attempt += 1;
                warn!(
                    error = %e,
                    attempt,
                    max_retries = settings.connect_retries,
                    delay_ms = delay.as_millis(),
                    "session database unreachable, retrying"
                );
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
            }
            Err(e) => return Err(RepositoryError::ConnectionFailed(e.to_string())),
        }
    }
}

/// Applies the embedded schema migrations.
#[instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<(), RepositoryError> {
    sqlx::migrate!()
        .run(pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(format!("migration failed: {e}")))?;

    info!("database migrations applied");
    Ok(())
}
