use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use crate::app_config::{TranscriptionConfig, TranslationConfig};
use crate::errors::ProviderError;
use crate::language_utils;
use crate::providers::{FillerSuggester, Transcriber, Translator};
use crate::timeline::{self, TimedSequence};

/// OpenAI client for chat completions
#[derive(Debug, Clone)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// Base URL, e.g. `https://api.openai.com/v1`
    endpoint: String,
}

/// Chat completion request
#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<OpenAIMessage>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    /// Generated choices
    pub choices: Vec<OpenAIChoice>,
    /// Token usage information
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

/// A single generated choice
#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    pub message: OpenAIMessage,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl OpenAIRequest {
    /// Create a new chat request
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(OpenAIMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of generated tokens
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

impl OpenAI {
    /// Create a new OpenAI client
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

    fn url(&self, path: &str) -> String {
        let base = if self.endpoint.is_empty() {
            "https://api.openai.com/v1"
        } else {
            self.endpoint.trim_end_matches('/')
        };
        format!("{}/{}", base, path)
    }

    /// Complete a chat request
    pub async fn complete(&self, request: OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        let response = self
            .client
            .post(self.url("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to send request to OpenAI API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenAI API error ({}): {}", status, error_text);
            return Err(status_error(status, error_text));
        }

        response
            .json::<OpenAIResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse OpenAI API response: {}", e)))
    }

    /// Extract the first choice's text
    pub fn extract_text_from_response(response: &OpenAIResponse) -> String {
        response
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default()
    }

    /// Transcribe an audio file, asking for timed-text output
    pub async fn transcribe_file(&self, model: &str, audio: &Path, language: Option<&str>) -> Result<String, ProviderError> {
        let bytes = tokio::fs::read(audio)
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to read {}: {}", audio.display(), e)))?;

        let file_name = audio
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio".to_string());

        let mut form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name))
            .text("model", model.to_string())
            .text("response_format", "srt");

        if let Some(language) = language {
            match language_utils::normalize_to_part1_or_part2t(language) {
                Ok(code) => form = form.text("language", code),
                Err(e) => warn!("Ignoring transcription language hint: {}", e),
            }
        }

        let response = self
            .client
            .post(self.url("audio/transcriptions"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to send audio to OpenAI API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("OpenAI transcription error ({}): {}", status, error_text);
            return Err(status_error(status, error_text));
        }

        response
            .text()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to read transcription: {}", e)))
    }
}

fn status_error(status: reqwest::StatusCode, message: String) -> ProviderError {
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        ProviderError::AuthenticationError(message)
    } else {
        ProviderError::ApiError {
            status_code: status.as_u16(),
            message,
        }
    }
}

// Substitute `{name}` placeholders in a prompt template
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{}}}", name), value)
    })
}

/// Chat-backed translation and filler suggestion
#[derive(Debug, Clone)]
pub struct OpenAIChat {
    client: OpenAI,
    model: String,
    temperature: f32,
    translation_prompt: String,
    filler_prompt: String,
}

impl OpenAIChat {
    pub fn from_config(config: &TranslationConfig) -> Self {
        Self {
            client: OpenAI::new(&config.api_key, &config.endpoint, config.timeout_secs),
            model: config.model.clone(),
            temperature: config.temperature,
            translation_prompt: config.translation_prompt.clone(),
            filler_prompt: config.filler_prompt.clone(),
        }
    }

    async fn ask(&self, prompt: String, max_tokens: u32) -> Result<String, ProviderError> {
        let request = OpenAIRequest::new(&self.model)
            .add_message("user", prompt)
            .temperature(self.temperature)
            .max_tokens(max_tokens);

        let response = self.client.complete(request).await?;
        if let Some(usage) = &response.usage {
            debug!("OpenAI usage: {} prompt / {} completion tokens", usage.prompt_tokens, usage.completion_tokens);
        }

        let text = OpenAI::extract_text_from_response(&response);
        if text.is_empty() {
            return Err(ProviderError::ParseError("Empty completion".to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl Translator for OpenAIChat {
    async fn translate(&self, text: &str, source_language: &str, target_language: &str) -> Result<String, ProviderError> {
        let prompt = fill_template(
            &self.translation_prompt,
            &[
                ("source_language", source_language),
                ("target_language", target_language),
                ("text", text),
            ],
        );
        self.ask(prompt, 1000).await
    }
}

#[async_trait]
impl FillerSuggester for OpenAIChat {
    async fn suggest_filler(&self, word: &str, language: &str) -> Result<String, ProviderError> {
        let prompt = fill_template(&self.filler_prompt, &[("language", language), ("word", word)]);
        let filler = self.ask(prompt, 10).await?;
        Ok(filler.trim_matches(|c: char| c == '\'' || c == '"').to_string())
    }
}

/// Audio transcription through the OpenAI transcription endpoint
#[derive(Debug, Clone)]
pub struct OpenAITranscriber {
    client: OpenAI,
    model: String,
}

impl OpenAITranscriber {
    /// `api_key` is passed separately since it may fall back to the translation key
    pub fn from_config(config: &TranscriptionConfig, api_key: &str) -> Self {
        Self {
            client: OpenAI::new(api_key, &config.endpoint, config.timeout_secs),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl Transcriber for OpenAITranscriber {
    async fn transcribe(&self, audio: &Path, language: Option<&str>) -> Result<TimedSequence, ProviderError> {
        let raw = self.client.transcribe_file(&self.model, audio, language).await?;
        let sequence = timeline::parse(&raw);
        if sequence.is_empty() {
            return Err(ProviderError::ParseError(format!(
                "Transcription of {} produced no timed entries",
                audio.display()
            )));
        }
        Ok(sequence)
    }
}

/// Default transcript location next to the audio
pub fn transcript_path_for(audio: &Path) -> PathBuf {
    audio.with_extension("srt")
}
