use std::time::Duration;

use anyhow::Context;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::json;

use crate::core::config::Settings;
use crate::services::errors::WorkflowError;

const SERVICE: &str = "speech synthesis";

/// ElevenLabs text-to-speech client.
#[derive(Debug, Clone)]
pub(crate) struct SpeechService {
    client: Client,
    api_key: String,
    base_url: String,
    voice_id: String,
    model_id: String,
}

impl SpeechService {
    /// `None` when no API key is configured.
    pub(crate) fn from_settings(settings: &Settings) -> anyhow::Result<Option<Self>> {
        let speech = settings.speech();
        if !speech.is_configured() {
            return Ok(None);
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(speech.timeout_seconds))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Some(Self {
            client,
            api_key: speech.api_key.clone(),
            base_url: speech.base_url.trim_end_matches('/').to_string(),
            voice_id: speech.voice_id.clone(),
            model_id: speech.model_id.clone(),
        }))
    }

    /// MPEG audio for `text`.
    pub(crate) async fn synthesize(&self, text: &str) -> Result<Vec<u8>, WorkflowError> {
        let url = format!("{}/v1/text-to-speech/{}", self.base_url, self.voice_id);

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header(ACCEPT, "audio/mpeg")
            .json(&json!({"text": text, "model_id": self.model_id}))
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

        let audio = response.bytes().await.map_err(|err| WorkflowError::transport(SERVICE, err))?;
        tracing::info!(characters = text.chars().count(), bytes = audio.len(), "Speech synthesized");
        Ok(audio.to_vec())
    }
}
