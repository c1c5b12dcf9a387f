use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::application::ports::SessionRepository;
use crate::application::services::{ExtractionDispatcher, SessionService};
use crate::config::Settings;
use crate::infrastructure::observability::{TracingConfig, init_tracing};
use crate::infrastructure::persistence::{
    InMemorySessionRepository, PgSessionRepository, create_pool,
};
use crate::infrastructure::text_processing::DecoderSetFactory;

/// Loads settings, installs the tracing subscriber they describe and builds
/// the session service. An already installed subscriber is left in place.
pub async fn bootstrap() -> anyhow::Result<SessionService> {
    let (settings, environment) = Settings::load().context("failed to load settings")?;

    if let Err(e) = init_tracing(TracingConfig::from_settings(&settings.logging, environment)) {
        tracing::debug!(error = %e, "keeping the existing tracing subscriber");
    }

    build_session_service(&settings).await
}

/// Wires the decoder set, the dispatcher and the session store described by
/// `settings`. Without a `database` section sessions live in process memory.
pub async fn build_session_service(settings: &Settings) -> anyhow::Result<SessionService> {
    let extraction = &settings.extraction;
    let dispatcher = Arc::new(ExtractionDispatcher::new(
        DecoderSetFactory::create(extraction),
        Duration::from_secs(extraction.timeout_secs),
    ));

    let repository: Arc<dyn SessionRepository> = match &settings.database {
        Some(database) => {
            let pool = create_pool(database)
                .await
                .context("failed to prepare the session database")?;
            Arc::new(PgSessionRepository::new(
                pool,
                settings.sessions.preview_chars,
                settings.sessions.max_append_attempts,
            ))
        }
        None => {
            tracing::warn!("No database configured, sessions are kept in memory only");
            Arc::new(InMemorySessionRepository::new(
                settings.sessions.preview_chars,
            ))
        }
    };

    tracing::info!(
        max_upload_bytes = extraction.max_upload_bytes,
        timeout_secs = extraction.timeout_secs,
        "Session service ready"
    );

    Ok(SessionService::new(
        dispatcher,
        repository,
        extraction.max_upload_bytes,
    ))
}
