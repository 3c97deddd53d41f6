use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, error};
use reqwest::Client;
use serde::Serialize;

use crate::app_config::SpeechConfig;
use crate::errors::ProviderError;
use crate::file_utils::FileManager;
use crate::providers::{SpeechSynthesizer, VoiceParams};

/// ElevenLabs text-to-speech client
#[derive(Debug, Clone)]
pub struct ElevenLabs {
    client: Client,
    api_key: String,
    /// Text-to-speech endpoint; the voice id is appended
    endpoint: String,
}

/// Synthesis request body
#[derive(Debug, Serialize)]
pub struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
pub struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

impl<'a> SpeechRequest<'a> {
    pub fn new(text: &'a str, voice: &'a VoiceParams) -> Self {
        Self {
            text,
            model_id: &voice.model_id,
            voice_settings: VoiceSettings {
                stability: voice.stability,
                similarity_boost: voice.similarity_boost,
            },
        }
    }
}

impl ElevenLabs {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    pub fn from_config(config: &SpeechConfig) -> Self {
        Self::new(&config.api_key, &config.endpoint, config.timeout_secs)
    }

    fn voice_url(&self, voice_id: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), voice_id)
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabs {
    async fn synthesize(&self, text: &str, voice: &VoiceParams, output: &Path) -> Result<PathBuf, ProviderError> {
        debug!("Synthesizing {} characters with voice {}", text.len(), voice.voice_id);

        let response = self
            .client
            .post(self.voice_url(&voice.voice_id))
            .header("Accept", "audio/mpeg")
            .header("xi-api-key", &self.api_key)
            .json(&SpeechRequest::new(text, voice))
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to send request to ElevenLabs API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("ElevenLabs API error ({}): {}", status, error_text);
            return Err(match status.as_u16() {
                401 | 403 => ProviderError::AuthenticationError(error_text),
                code => ProviderError::ApiError {
                    status_code: code,
                    message: error_text,
                },
            });
        }

        let audio: Bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to read audio response: {}", e)))?;

        if audio.is_empty() {
            return Err(ProviderError::ParseError("ElevenLabs returned no audio".to_string()));
        }

        FileManager::write_bytes(output, &audio).map_err(|e| ProviderError::OutputError(e.to_string()))?;
        debug!("Wrote {} bytes of audio to {}", audio.len(), output.display());

        Ok(output.to_path_buf())
    }
}
