use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use url::Url;

use crate::timeline::TimeFormat;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language (ISO code or English name)
    pub source_language: String,

    /// Target language (ISO code or English name)
    pub target_language: String,

    /// Reflow bounds
    #[serde(default)]
    pub reflow: ReflowConfig,

    /// Audio reconciliation bounds
    #[serde(default)]
    pub reconcile: ReconcileConfig,

    /// Timestamp profile used when writing timed text
    #[serde(default)]
    pub time_format: TimeFormat,

    /// External media tools
    #[serde(default)]
    pub media: MediaToolsConfig,

    /// Translation and filler-word service
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Speech synthesis service
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Transcription service
    #[serde(default)]
    pub transcription: TranscriptionConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Word-count bounds for the reflow engine
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ReflowConfig {
    /// Entries shorter than this are never emitted standalone (except the last)
    #[serde(default = "default_min_words")]
    pub min_words: usize,

    /// Hard upper bound of words per entry
    #[serde(default = "default_max_words")]
    pub max_words: usize,
}

impl Default for ReflowConfig {
    fn default() -> Self {
        Self {
            min_words: default_min_words(),
            max_words: default_max_words(),
        }
    }
}

impl ReflowConfig {
    // @param min_words, max_words: Word bounds
    pub fn new(min_words: usize, max_words: usize) -> Self {
        Self { min_words, max_words }
    }

    /// Validate the bounds
    pub fn validate(&self) -> Result<()> {
        if self.max_words == 0 {
            return Err(anyhow!("reflow.max_words must be at least 1"));
        }
        if self.min_words > self.max_words {
            return Err(anyhow!(
                "reflow.min_words ({}) must not exceed reflow.max_words ({})",
                self.min_words, self.max_words
            ));
        }
        Ok(())
    }
}

/// Bounds for the audio stretch decision
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ReconcileConfig {
    /// Lowest stretch factor considered natural-sounding
    #[serde(default = "default_min_stretch")]
    pub min_stretch: f64,

    /// Highest stretch factor considered natural-sounding
    #[serde(default = "default_max_stretch")]
    pub max_stretch: f64,

    /// Deviations from 1.0 up to this value are left untouched
    #[serde(default = "default_fine_threshold")]
    pub fine_threshold: f64,

    /// Lowest multiplier a single tempo stage accepts
    #[serde(default = "default_stage_min")]
    pub stage_min: f64,

    /// Highest multiplier a single tempo stage accepts
    #[serde(default = "default_stage_max")]
    pub stage_max: f64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            min_stretch: default_min_stretch(),
            max_stretch: default_max_stretch(),
            fine_threshold: default_fine_threshold(),
            stage_min: default_stage_min(),
            stage_max: default_stage_max(),
        }
    }
}

impl ReconcileConfig {
    /// Validate the bounds
    pub fn validate(&self) -> Result<()> {
        let all_finite = [self.min_stretch, self.max_stretch, self.fine_threshold, self.stage_min, self.stage_max]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(anyhow!("reconcile bounds must be finite numbers"));
        }
        if self.min_stretch <= 0.0 || self.min_stretch > 1.0 || self.max_stretch < 1.0 {
            return Err(anyhow!(
                "reconcile stretch range [{}, {}] must be positive and contain 1.0",
                self.min_stretch, self.max_stretch
            ));
        }
        if self.fine_threshold < 0.0 {
            return Err(anyhow!("reconcile.fine_threshold must not be negative"));
        }
        if self.stage_min <= 0.0 || self.stage_min >= 1.0 || self.stage_max <= 1.0 {
            return Err(anyhow!(
                "reconcile stage range [{}, {}] must satisfy 0 < min < 1 < max",
                self.stage_min, self.stage_max
            ));
        }
        Ok(())
    }
}

/// Paths and limits for ffmpeg/ffprobe
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MediaToolsConfig {
    /// ffmpeg binary
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// ffprobe binary
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,

    /// Process timeout in seconds
    #[serde(default = "default_media_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for MediaToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            timeout_secs: default_media_timeout_secs(),
        }
    }
}

/// Translation service configuration (OpenAI-compatible chat completions)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Model name (e.g., "gpt-3.5-turbo")
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// API key for the service
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service endpoint URL
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,

    /// Maximum number of concurrent requests
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Prefix single-word entries with a natural filler word
    #[serde(default = "default_true")]
    pub add_fillers: bool,

    /// Prompt template for translation
    /// Placeholders: {source_language}, {target_language}, {text}
    #[serde(default = "default_translation_prompt")]
    pub translation_prompt: String,

    /// Prompt template for filler suggestions
    /// Placeholders: {language}, {word}
    #[serde(default = "default_filler_prompt")]
    pub filler_prompt: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            model: default_chat_model(),
            api_key: String::new(),
            endpoint: default_openai_endpoint(),
            concurrent_requests: default_concurrent_requests(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            add_fillers: default_true(),
            translation_prompt: default_translation_prompt(),
            filler_prompt: default_filler_prompt(),
        }
    }
}

/// Speech synthesis configuration (ElevenLabs text-to-speech)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SpeechConfig {
    /// API key for the service
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Text-to-speech endpoint; the voice id is appended
    #[serde(default = "default_speech_endpoint")]
    pub endpoint: String,

    /// Voice id
    #[serde(default = "default_voice_id")]
    pub voice_id: String,

    /// Synthesis model id
    #[serde(default = "default_speech_model")]
    pub model_id: String,

    /// Voice stability (0.0 to 1.0)
    #[serde(default = "default_voice_setting")]
    pub stability: f32,

    /// Voice similarity boost (0.0 to 1.0)
    #[serde(default = "default_voice_setting")]
    pub similarity_boost: f32,

    /// Request timeout in seconds
    #[serde(default = "default_speech_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_speech_endpoint(),
            voice_id: default_voice_id(),
            model_id: default_speech_model(),
            stability: default_voice_setting(),
            similarity_boost: default_voice_setting(),
            timeout_secs: default_speech_timeout_secs(),
        }
    }
}

/// Transcription configuration (OpenAI-compatible audio transcriptions)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranscriptionConfig {
    /// Model name (e.g., "whisper-1")
    #[serde(default = "default_transcription_model")]
    pub model: String,

    /// API key; falls back to the translation key when empty
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service endpoint URL
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_speech_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: default_transcription_model(),
            api_key: String::new(),
            endpoint: default_openai_endpoint(),
            timeout_secs: default_speech_timeout_secs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    // @returns: Matching log filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_min_words() -> usize {
    4
}

fn default_max_words() -> usize {
    15
}

fn default_min_stretch() -> f64 {
    0.9
}

fn default_max_stretch() -> f64 {
    1.1
}

fn default_fine_threshold() -> f64 {
    0.08
}

fn default_stage_min() -> f64 {
    0.5
}

fn default_stage_max() -> f64 {
    2.0
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

fn default_media_timeout_secs() -> u64 {
    300
}

fn default_concurrent_requests() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_speech_timeout_secs() -> u64 {
    120
}

fn default_temperature() -> f32 {
    0.3
}

fn default_true() -> bool {
    true
}

fn default_voice_setting() -> f32 {
    0.5
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_speech_endpoint() -> String {
    "https://api.elevenlabs.io/v1/text-to-speech".to_string()
}

fn default_chat_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_voice_id() -> String {
    "21m00Tcm4TlvDq8ikWAM".to_string()
}

fn default_speech_model() -> String {
    "eleven_monolingual_v1".to_string()
}

fn default_translation_prompt() -> String {
    "Translate the following text from {source_language} to {target_language}:\n'{text}'".to_string()
}

fn default_filler_prompt() -> String {
    "Suggest a suitable natural filler word in {language} before '{word}'. Return only the filler word.".to_string()
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        crate::language_utils::resolve_language_name(&self.source_language)?;
        crate::language_utils::resolve_language_name(&self.target_language)?;

        self.reflow.validate()?;
        self.reconcile.validate()?;

        if self.media.ffmpeg_path.trim().is_empty() || self.media.ffprobe_path.trim().is_empty() {
            return Err(anyhow!("media.ffmpeg_path and media.ffprobe_path must not be empty"));
        }

        validate_endpoint("translation.endpoint", &self.translation.endpoint)?;
        validate_endpoint("speech.endpoint", &self.speech.endpoint)?;
        validate_endpoint("transcription.endpoint", &self.transcription.endpoint)?;

        if self.translation.concurrent_requests == 0 {
            return Err(anyhow!("translation.concurrent_requests must be at least 1"));
        }

        Ok(())
    }

    /// Check the settings required by the translation and filler stages
    pub fn validate_for_translation(&self) -> Result<()> {
        if self.translation.api_key.trim().is_empty() {
            return Err(anyhow!("Translation API key is required (translation.api_key or OPENAI_API_KEY)"));
        }
        Ok(())
    }

    /// Check the settings required by the speech synthesis stage
    pub fn validate_for_speech(&self) -> Result<()> {
        if self.speech.api_key.trim().is_empty() {
            return Err(anyhow!("Speech API key is required (speech.api_key or ELEVEN_LABS_API_KEY)"));
        }
        if self.speech.voice_id.trim().is_empty() {
            return Err(anyhow!("speech.voice_id must not be empty"));
        }
        Ok(())
    }

    /// Check the settings required by the transcription stage
    pub fn validate_for_transcription(&self) -> Result<()> {
        if self.transcription_api_key().trim().is_empty() {
            return Err(anyhow!("Transcription API key is required (transcription.api_key or translation.api_key)"));
        }
        Ok(())
    }

    /// Transcription key, falling back to the translation key
    pub fn transcription_api_key(&self) -> String {
        if !self.transcription.api_key.is_empty() {
            self.transcription.api_key.clone()
        } else {
            self.translation.api_key.clone()
        }
    }
}

fn validate_endpoint(name: &str, endpoint: &str) -> Result<()> {
    Url::parse(endpoint).map_err(|e| anyhow!("Invalid {} '{}': {}", name, endpoint, e))?;
    Ok(())
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: "en".to_string(),
            target_language: "es".to_string(),
            reflow: ReflowConfig::default(),
            reconcile: ReconcileConfig::default(),
            time_format: TimeFormat::default(),
            media: MediaToolsConfig::default(),
            translation: TranslationConfig::default(),
            speech: SpeechConfig::default(),
            transcription: TranscriptionConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
