/*!
 * Collaborator services used around the dubbing pipeline.
 *
 * Each capability is a narrow trait so the pipeline can be driven by real
 * HTTP clients or by the mocks in [`mock`]:
 * - OpenAI: chat completions (translation, filler words) and audio transcription
 * - ElevenLabs: text-to-speech
 */

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::app_config::SpeechConfig;
use crate::errors::ProviderError;
use crate::timeline::TimedSequence;

/// Translates a piece of text between two languages
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from `source_language` to `target_language`
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The translated text or an error
    async fn translate(&self, text: &str, source_language: &str, target_language: &str) -> Result<String, ProviderError>;
}

/// Suggests a natural filler word to put before a lone word
#[async_trait]
pub trait FillerSuggester: Send + Sync {
    async fn suggest_filler(&self, word: &str, language: &str) -> Result<String, ProviderError>;
}

/// Voice settings passed to speech synthesis
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceParams {
    pub voice_id: String,
    pub model_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
}

impl From<&SpeechConfig> for VoiceParams {
    fn from(config: &SpeechConfig) -> Self {
        Self {
            voice_id: config.voice_id.clone(),
            model_id: config.model_id.clone(),
            stability: config.stability,
            similarity_boost: config.similarity_boost,
        }
    }
}

/// Renders narration text to an audio file
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` into `output`, returning the written path
    async fn synthesize(&self, text: &str, voice: &VoiceParams, output: &Path) -> Result<PathBuf, ProviderError>;
}

/// Produces a timed sequence from spoken audio
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe `audio`; `language` is an optional hint
    async fn transcribe(&self, audio: &Path, language: Option<&str>) -> Result<TimedSequence, ProviderError>;
}

pub mod openai;
pub mod elevenlabs;
pub mod mock;
