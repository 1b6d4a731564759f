use async_trait::async_trait;
use log::{debug, error};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::errors::ServiceError;
use super::Transcriber;

/// Default public endpoint
const DEFAULT_ENDPOINT: &str = "https://api.openai.com";

/// OpenAI Whisper client used to transcribe source narration
#[derive(Debug, Clone)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API base URL, empty for the public API
    endpoint: String,
    /// Transcription model
    model: String,
}

/// Transcription response
#[derive(Debug, Deserialize)]
pub struct TranscriptionResponse {
    /// Recognized text
    pub text: String,
}

impl OpenAI {
    /// Create a new OpenAI client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    fn transcription_url(&self) -> String {
        let base = if self.endpoint.is_empty() { DEFAULT_ENDPOINT } else { self.endpoint.as_str() };
        format!("{}/v1/audio/transcriptions", base.trim_end_matches('/'))
    }
}

#[async_trait]
impl Transcriber for OpenAI {
    async fn transcribe(&self, audio: &Path) -> Result<String, ServiceError> {
        let bytes = tokio::fs::read(audio)
            .await
            .map_err(|e| ServiceError::fatal(format!("Cannot read {}: {}", audio.display(), e)))?;
        let file_name = audio
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio.mp3".to_string());

        debug!("Uploading {} ({} bytes) for transcription", file_name, bytes.len());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/mpeg")
            .map_err(|e| ServiceError::fatal(e.to_string()))?;
        let form = Form::new().text("model", self.model.clone()).part("file", part);

        let response = self
            .client
            .post(self.transcription_url())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenAI API error ({}): {}", status, error_text);
            return Err(ServiceError::from_status(status.as_u16(), &error_text));
        }

        let body = response
            .json::<TranscriptionResponse>()
            .await
            .map_err(|e| ServiceError::fatal(format!("Failed to parse OpenAI API response: {}", e)))?;
        Ok(body.text)
    }
}
