use std::sync::Arc;

use sqlx::PgPool;

use crate::core::{config::Settings, redis::RedisHandle};
use crate::services::chat_context::ContextBuilder;
use crate::services::course_provider::CourseProvider;
use crate::services::language_model::LanguageModel;
use crate::services::speech::SpeechService;

/// External services the workflows talk to, built once at startup.
#[derive(Clone)]
pub(crate) struct Collaborators {
    pub(crate) language_model: Arc<dyn LanguageModel>,
    pub(crate) course_provider: Arc<dyn CourseProvider>,
    pub(crate) context_builder: Arc<dyn ContextBuilder>,
    pub(crate) speech: Option<SpeechService>,
}

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    redis: RedisHandle,
    collaborators: Collaborators,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        db: PgPool,
        redis: RedisHandle,
        collaborators: Collaborators,
    ) -> Self {
        Self { inner: Arc::new(InnerState { settings, db, redis, collaborators }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn redis(&self) -> &RedisHandle {
        &self.inner.redis
    }

    pub(crate) fn language_model(&self) -> &dyn LanguageModel {
        self.inner.collaborators.language_model.as_ref()
    }

    pub(crate) fn course_provider(&self) -> &dyn CourseProvider {
        self.inner.collaborators.course_provider.as_ref()
    }

    pub(crate) fn context_builder(&self) -> &dyn ContextBuilder {
        self.inner.collaborators.context_builder.as_ref()
    }

    pub(crate) fn speech(&self) -> Option<&SpeechService> {
        self.inner.collaborators.speech.as_ref()
    }
}
