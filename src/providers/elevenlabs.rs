use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::errors::ServiceError;
use super::SpeechSynthesizer;

/// Default public endpoint
const DEFAULT_ENDPOINT: &str = "https://api.elevenlabs.io";

/// Voice rendering parameters
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.8,
            style: 0.0,
            use_speaker_boost: true,
        }
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

/// ElevenLabs text-to-speech client
#[derive(Debug, Clone)]
pub struct ElevenLabs {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    settings: VoiceSettings,
}

impl ElevenLabs {
    /// Create a new ElevenLabs client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        settings: VoiceSettings,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
            settings,
        }
    }

    fn stream_url(&self, voice_id: &str) -> String {
        let base = if self.endpoint.is_empty() { DEFAULT_ENDPOINT } else { self.endpoint.as_str() };
        format!("{}/v1/text-to-speech/{}/stream", base.trim_end_matches('/'), voice_id)
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabs {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, ServiceError> {
        let request = SpeechRequest {
            text,
            model_id: &self.model,
            voice_settings: self.settings,
        };

        let response = self
            .client
            .post(self.stream_url(voice_id))
            .header("Accept", "application/json")
            .header("xi-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("ElevenLabs API error ({}): {}", status, error_text);
            return Err(ServiceError::from_status(status.as_u16(), &error_text));
        }

        let audio = response.bytes().await.map_err(|e| ServiceError::from_reqwest(&e))?;
        if audio.is_empty() {
            return Err(ServiceError::fatal("ElevenLabs returned an empty audio stream"));
        }
        Ok(audio.to_vec())
    }
}
