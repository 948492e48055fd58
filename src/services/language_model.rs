use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::core::{config::Settings, metrics};
use crate::db::types::MessageRole;
use crate::services::errors::WorkflowError;

const SERVICE: &str = "language model";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PromptMessage {
    pub(crate) role: MessageRole,
    pub(crate) content: String,
}

impl PromptMessage {
    pub(crate) fn system(content: impl Into<String>) -> Self {
        Self { role: MessageRole::System, content: content.into() }
    }

    pub(crate) fn user(content: impl Into<String>) -> Self {
        Self { role: MessageRole::User, content: content.into() }
    }
}

/// JSON schema the model output must follow.
#[derive(Debug, Clone)]
pub(crate) struct OutputSchema {
    pub(crate) name: &'static str,
    pub(crate) schema: Value,
}

#[derive(Debug, Clone)]
pub(crate) struct CompletionRequest {
    /// Metric label, e.g. `refinement` or `tutoring`.
    pub(crate) purpose: &'static str,
    pub(crate) messages: Vec<PromptMessage>,
    pub(crate) output: Option<OutputSchema>,
}

/// Chat-completion backend. Returns the raw content string of the first choice.
#[async_trait]
pub(crate) trait LanguageModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, WorkflowError>;
}

/// Runs a completion with an output schema and decodes the content into `T`.
pub(crate) async fn complete_structured<T: DeserializeOwned>(
    model: &dyn LanguageModel,
    request: CompletionRequest,
) -> Result<T, WorkflowError> {
    let purpose = request.purpose;
    let content = model.complete(request).await?;
    serde_json::from_str(&content).map_err(|err| {
        WorkflowError::invalid(format!("Malformed {purpose} output from language model: {err}"))
    })
}

#[derive(Debug, Clone)]
pub(crate) struct OpenAiLanguageModel {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl OpenAiLanguageModel {
    pub(crate) fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(settings.ai().ai_request_timeout);
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key: settings.ai().openai_api_key.clone(),
            base_url: settings.ai().openai_base_url.trim_end_matches('/').to_string(),
            model: settings.ai().ai_model.clone(),
            max_tokens: settings.ai().ai_max_tokens,
            temperature: settings.ai().ai_temperature,
        })
    }

    fn payload(&self, request: &CompletionRequest) -> Value {
        let messages = request
            .messages
            .iter()
            .map(|message| json!({"role": message.role.as_wire(), "content": message.content}))
            .collect::<Vec<_>>();

        let mut payload = json!({
            "model": self.model,
            "messages": messages,
            "max_completion_tokens": self.max_tokens,
            "temperature": self.temperature,
        });

        if let Some(output) = &request.output {
            payload["response_format"] = json!({
                "type": "json_schema",
                "json_schema": {"name": output.name, "strict": true, "schema": output.schema}
            });
        }

        payload
    }

    async fn send(&self, request: &CompletionRequest) -> Result<String, WorkflowError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.payload(request))
            .send()
            .await
            .map_err(|err| WorkflowError::transport(SERVICE, err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WorkflowError::Upstream {
                service: SERVICE,
                status: Some(status.as_u16()),
                body,
            });
        }

        let body = response.text().await.map_err(|err| WorkflowError::transport(SERVICE, err))?;
        message_content(&body)
    }
}

/// Pulls `choices[0].message.content` out of a chat-completions body.
fn message_content(body: &str) -> Result<String, WorkflowError> {
    let body: Value = serde_json::from_str(body).map_err(|err| {
        WorkflowError::invalid(format!("Malformed language model response: {err}"))
    })?;

    body.get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|value| value.as_str())
        .map(str::to_string)
        .ok_or_else(|| WorkflowError::invalid("Missing content in language model response"))
}

#[async_trait]
impl LanguageModel for OpenAiLanguageModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String, WorkflowError> {
        if self.api_key.is_empty() {
            return Err(WorkflowError::Unavailable("Language model is not configured".to_string()));
        }

        let timer = Instant::now();
        tracing::info!(
            purpose = request.purpose,
            messages = request.messages.len(),
            structured = request.output.is_some(),
            "Sending language model request"
        );

        let result = self.send(&request).await;
        let elapsed = timer.elapsed();
        metrics::record_llm_call(request.purpose, result.is_ok(), elapsed);

        match &result {
            Ok(content) => tracing::info!(
                purpose = request.purpose,
                duration_seconds = elapsed.as_secs_f64(),
                content_len = content.len(),
                "Language model request completed"
            ),
            Err(err) => tracing::warn!(
                purpose = request.purpose,
                duration_seconds = elapsed.as_secs_f64(),
                error = %err,
                "Language model request failed"
            ),
        }

        result
    }
}
