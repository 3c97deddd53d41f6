/*!
 * Mock collaborators for testing.
 *
 * - `MockProvider` implements translation and filler suggestion with a
 *   selectable `MockBehavior` (working, intermittent, failing, empty, slow)
 * - `MockSpeech` writes placeholder audio and records what it was asked to say
 * - `MockTranscriber` returns a fixed sequence
 * - `MockMedia` fakes ffprobe/ffmpeg with a fixed duration and records calls
 */

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::{MediaError, ProviderError};
use crate::media::{MediaProbe, MediaTempoTransform};
use crate::providers::{FillerSuggester, SpeechSynthesizer, Transcriber, Translator, VoiceParams};
use crate::timeline::TimedSequence;

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails every Nth request
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Succeeds with an empty string
    Empty,
    /// Succeeds after a delay
    Slow { delay_ms: u64 },
}

/// Mock translator / filler suggester
#[derive(Debug, Clone)]
pub struct MockProvider {
    behavior: MockBehavior,
    /// Shared between clones
    request_count: Arc<AtomicUsize>,
    custom_response: Option<fn(&str) -> String>,
    filler: String,
}

impl MockProvider {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            custom_response: None,
            filler: "well".to_string(),
        }
    }

    /// Always succeeds with `[<target>] <text>`
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Replace the default translation output
    pub fn with_custom_response(mut self, generator: fn(&str) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Filler word returned by `suggest_filler`
    pub fn with_filler(mut self, filler: impl Into<String>) -> Self {
        self.filler = filler.into();
        self
    }

    /// Number of requests served so far (including failures)
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    async fn respond(&self, success: String) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Working => Ok(success),
            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        status_code: 503,
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                    })
                } else {
                    Ok(success)
                }
            }
            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 500,
                message: "Simulated provider failure".to_string(),
            }),
            MockBehavior::Empty => Ok(String::new()),
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(success)
            }
        }
    }
}

#[async_trait]
impl Translator for MockProvider {
    async fn translate(&self, text: &str, _source_language: &str, target_language: &str) -> Result<String, ProviderError> {
        let success = match self.custom_response {
            Some(generator) => generator(text),
            None => format!("[{}] {}", target_language, text),
        };
        self.respond(success).await
    }
}

#[async_trait]
impl FillerSuggester for MockProvider {
    async fn suggest_filler(&self, _word: &str, _language: &str) -> Result<String, ProviderError> {
        self.respond(self.filler.clone()).await
    }
}

/// Speech synthesizer writing placeholder bytes
#[derive(Debug, Default)]
pub struct MockSpeech {
    fail: bool,
    spoken: Mutex<Vec<String>>,
}

impl MockSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Texts passed to `synthesize`, in call order
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSpeech {
    async fn synthesize(&self, text: &str, _voice: &VoiceParams, output: &Path) -> Result<PathBuf, ProviderError> {
        self.spoken.lock().push(text.to_string());

        if self.fail {
            return Err(ProviderError::ApiError {
                status_code: 500,
                message: "Simulated synthesis failure".to_string(),
            });
        }

        tokio::fs::write(output, b"ID3mock-audio")
            .await
            .map_err(|e| ProviderError::OutputError(e.to_string()))?;
        Ok(output.to_path_buf())
    }
}

/// Transcriber returning a preset sequence
#[derive(Debug, Clone)]
pub struct MockTranscriber {
    sequence: TimedSequence,
}

impl MockTranscriber {
    pub fn new(sequence: TimedSequence) -> Self {
        Self { sequence }
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, audio: &Path, _language: Option<&str>) -> Result<TimedSequence, ProviderError> {
        if self.sequence.is_empty() {
            return Err(ProviderError::ParseError(format!("No speech found in {}", audio.display())));
        }
        Ok(self.sequence.clone())
    }
}

/// A call recorded by `MockMedia`
#[derive(Debug, Clone, PartialEq)]
pub enum MediaCall {
    Probe(PathBuf),
    StreamCopy { input: PathBuf, output: PathBuf },
    ApplyTempo { input: PathBuf, output: PathBuf, stages: Vec<f64> },
}

/// Fake media tools; copies the input file on both write paths
#[derive(Debug, Default)]
pub struct MockMedia {
    duration: Option<f64>,
    calls: Mutex<Vec<MediaCall>>,
}

impl MockMedia {
    /// Probe always reports `secs`
    pub fn with_duration(secs: f64) -> Self {
        Self {
            duration: Some(secs),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Probe always fails
    pub fn failing_probe() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<MediaCall> {
        self.calls.lock().clone()
    }

    async fn copy_file(input: &Path, output: &Path) -> Result<(), MediaError> {
        tokio::fs::copy(input, output)
            .await
            .map(|_| ())
            .map_err(|e| MediaError::Failed {
                tool: "mock".to_string(),
                code: None,
                stderr: e.to_string(),
            })
    }
}

#[async_trait]
impl MediaProbe for MockMedia {
    async fn probe_duration(&self, path: &Path) -> Result<f64, MediaError> {
        self.calls.lock().push(MediaCall::Probe(path.to_path_buf()));
        self.duration.ok_or_else(|| MediaError::UnparseableOutput {
            tool: "mock".to_string(),
            output: "N/A".to_string(),
        })
    }
}

#[async_trait]
impl MediaTempoTransform for MockMedia {
    async fn apply_tempo(&self, input: &Path, output: &Path, stages: &[f64]) -> Result<(), MediaError> {
        self.calls.lock().push(MediaCall::ApplyTempo {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            stages: stages.to_vec(),
        });
        Self::copy_file(input, output).await
    }

    async fn stream_copy(&self, input: &Path, output: &Path) -> Result<(), MediaError> {
        self.calls.lock().push(MediaCall::StreamCopy {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
        });
        Self::copy_file(input, output).await
    }
}
