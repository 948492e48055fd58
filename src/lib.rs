pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use crate::core::state::Collaborators;
use crate::core::{config::Settings, redis::RedisHandle, state::AppState, telemetry};
use crate::services::chat_context;
use crate::services::course_provider::HttpCourseProvider;
use crate::services::language_model::OpenAiLanguageModel;
use crate::services::speech::SpeechService;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let db_pool = db::init_pool(&settings).await?;
    db::run_migrations(&db_pool).await?;

    let redis = RedisHandle::new(settings.redis().redis_url());
    if let Err(err) = redis.connect().await {
        tracing::error!(error = %err, "Failed to connect to Redis; continuing without rate limiting");
    } else {
        tracing::info!("Redis connected successfully");
    }

    let collaborators = build_collaborators(&settings)?;
    let state = AppState::new(settings, db_pool, redis.clone(), collaborators);

    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        "Quiz tutor API listening"
    );

    let result =
        axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await;

    redis.disconnect().await;
    tracing::info!("Redis disconnected");

    result?;

    Ok(())
}

fn build_collaborators(settings: &Settings) -> anyhow::Result<Collaborators> {
    let speech = SpeechService::from_settings(settings)?;
    if speech.is_none() {
        tracing::warn!("ELEVENLABS_API_KEY not set; speech synthesis disabled");
    }

    Ok(Collaborators {
        language_model: Arc::new(OpenAiLanguageModel::from_settings(settings)?),
        course_provider: Arc::new(HttpCourseProvider::from_settings(settings)?),
        context_builder: chat_context::from_settings(settings),
        speech,
    })
}
