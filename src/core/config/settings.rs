use super::parsing::{
    env_optional, env_or_default, parse_bool, parse_cors_origins, parse_environment,
    parse_temperature, parse_u16, parse_u32, parse_u64, parse_usize,
};
use super::types::{
    AiSettings, ApiSettings, ConfigError, CorsSettings, CourseProviderSettings, DatabaseSettings,
    RedisSettings, RuntimeSettings, ServerHost, ServerPort, ServerSettings, Settings,
    SpeechSettings, TelemetrySettings, TutoringSettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("QUIZ_TUTOR_HOST", "0.0.0.0");
        let port = env_or_default("QUIZ_TUTOR_PORT", "8000");

        let environment = parse_environment(
            env_optional("QUIZ_TUTOR_ENV").or_else(|| env_optional("ENVIRONMENT")),
        );
        let strict_config = env_optional("QUIZ_TUTOR_STRICT_CONFIG")
            .map(|value| parse_bool(&value))
            .unwrap_or(false)
            || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "Quiz Tutor API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_v1_str = env_or_default("API_V1_STR", "/api/v1");

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_u16("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "quiztutor");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "quiz_tutor");
        let database_url = env_optional("DATABASE_URL");

        let redis_host = env_or_default("REDIS_HOST", "localhost");
        let redis_port = parse_u16("REDIS_PORT", env_or_default("REDIS_PORT", "6379"))?;
        let redis_db = parse_u16("REDIS_DB", env_or_default("REDIS_DB", "0"))?;
        let redis_password = env_or_default("REDIS_PASSWORD", "");

        let openai_api_key = env_or_default("OPENAI_API_KEY", "");
        let openai_base_url = env_or_default("OPENAI_BASE_URL", "https://api.openai.com/v1");
        let ai_model = env_or_default("AI_MODEL", "gpt-4o-2024-08-06");
        let ai_max_tokens = parse_u32("AI_MAX_TOKENS", env_or_default("AI_MAX_TOKENS", "16384"))?;
        let ai_temperature =
            parse_temperature("AI_TEMPERATURE", env_or_default("AI_TEMPERATURE", "1.0"))?;
        let ai_request_timeout =
            parse_u64("AI_REQUEST_TIMEOUT", env_or_default("AI_REQUEST_TIMEOUT", "120"))?;

        let course_provider_base_url =
            env_or_default("COURSE_PROVIDER_BASE_URL", "https://api-beta.iclicker.com");
        let course_provider_page_size = parse_u32(
            "COURSE_PROVIDER_PAGE_SIZE",
            env_or_default("COURSE_PROVIDER_PAGE_SIZE", "10"),
        )?;
        let course_provider_timeout =
            parse_u64("COURSE_PROVIDER_TIMEOUT", env_or_default("COURSE_PROVIDER_TIMEOUT", "30"))?;

        let speech_api_key = env_or_default("ELEVENLABS_API_KEY", "");
        let speech_base_url = env_or_default("ELEVENLABS_BASE_URL", "https://api.elevenlabs.io");
        // "Adam" in the ElevenLabs premade voice library.
        let speech_voice_id = env_or_default("ELEVENLABS_VOICE_ID", "pNInz6obpgDQGcFmaJgB");
        let speech_model_id = env_or_default("ELEVENLABS_MODEL_ID", "eleven_monolingual_v1");
        let speech_timeout =
            parse_u64("ELEVENLABS_TIMEOUT", env_or_default("ELEVENLABS_TIMEOUT", "60"))?;

        let context_window =
            parse_usize("CHAT_CONTEXT_WINDOW", env_or_default("CHAT_CONTEXT_WINDOW", "0"))?;
        let rate_limit_per_minute = parse_u64(
            "CHAT_RATE_LIMIT_PER_MINUTE",
            env_or_default("CHAT_RATE_LIMIT_PER_MINUTE", "30"),
        )?;

        let log_level = env_or_default("QUIZ_TUTOR_LOG_LEVEL", "info");
        let json =
            env_optional("QUIZ_TUTOR_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_v1_str },
            cors: CorsSettings { origins: cors_origins },
            database: DatabaseSettings {
                postgres_server,
                postgres_port,
                postgres_user,
                postgres_password,
                postgres_db,
                database_url,
            },
            redis: RedisSettings {
                host: redis_host,
                port: redis_port,
                db: redis_db,
                password: redis_password,
            },
            ai: AiSettings {
                openai_api_key,
                openai_base_url,
                ai_model,
                ai_max_tokens,
                ai_temperature,
                ai_request_timeout,
            },
            course_provider: CourseProviderSettings {
                base_url: course_provider_base_url,
                page_size: course_provider_page_size,
                timeout_seconds: course_provider_timeout,
            },
            speech: SpeechSettings {
                api_key: speech_api_key,
                base_url: speech_base_url,
                voice_id: speech_voice_id,
                model_id: speech_model_id,
                timeout_seconds: speech_timeout,
            },
            tutoring: TutoringSettings { context_window, rate_limit_per_minute },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn redis(&self) -> &RedisSettings {
        &self.redis
    }

    pub(crate) fn ai(&self) -> &AiSettings {
        &self.ai
    }

    pub(crate) fn course_provider(&self) -> &CourseProviderSettings {
        &self.course_provider
    }

    pub(crate) fn speech(&self) -> &SpeechSettings {
        &self.speech
    }

    pub(crate) fn tutoring(&self) -> &TutoringSettings {
        &self.tutoring
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.course_provider.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "COURSE_PROVIDER_PAGE_SIZE",
                value: "0".to_string(),
            });
        }

        if self.tutoring.rate_limit_per_minute == 0 {
            return Err(ConfigError::InvalidValue {
                field: "CHAT_RATE_LIMIT_PER_MINUTE",
                value: "0".to_string(),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }
        if self.ai.openai_api_key.is_empty() {
            return Err(ConfigError::MissingSecret("OPENAI_API_KEY"));
        }
        if self.ai.openai_base_url.is_empty() {
            return Err(ConfigError::MissingSecret("OPENAI_BASE_URL"));
        }
        if self.course_provider.base_url.is_empty() {
            return Err(ConfigError::MissingSecret("COURSE_PROVIDER_BASE_URL"));
        }

        Ok(())
    }
}
