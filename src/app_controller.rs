use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::app_config::Config;
use crate::errors::TimelineError;
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::media::{MediaProbe, MediaTempoTransform};
use crate::providers::{FillerSuggester, SpeechSynthesizer, Transcriber, Translator, VoiceParams};
use crate::reconcile::{plan_adjustment, Adjustment, DurationReconciler, ReconcileOutcome};
use crate::reflow::{ReflowReport, Reflower};
use crate::timeline::{self, TimedSequence};
use crate::translation_service::{narration_text, TranslationService};

// @module: Application controller for the dubbing workflow

// @const: Extensions read as timelines; anything else is treated as audio
const TIMELINE_EXTENSIONS: [&str; 1] = ["srt"];

// @const: Summary log written next to batch output
const BATCH_LOG_FILE: &str = "smartdub.log";

// @const: Suffix of batch reflow outputs
const REFLOW_SUFFIX: &str = "reflowed";

/// External services used by the full dubbing pipeline
pub struct Collaborators {
    pub translator: Arc<dyn Translator>,
    pub filler: Option<Arc<dyn FillerSuggester>>,
    pub speech: Arc<dyn SpeechSynthesizer>,
}

/// Files produced by a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineArtifacts {
    /// Timeline transcribed from the input audio, when the run started from audio
    pub transcript: Option<PathBuf>,
    pub translated: PathBuf,
    pub filled: Option<PathBuf>,
    pub reflowed: PathBuf,
    pub audio: PathBuf,
    pub adjusted: Option<ReconcileOutcome>,
    pub reflow_report: ReflowReport,
}

/// Counters for a batch reflow run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    /// Controller with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a controller after validating the configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn reflower(&self) -> Result<Reflower> {
        Ok(Reflower::with_config(self.config.reflow)?)
    }

    /// Reflow one timeline file into another
    pub fn reflow_file(&self, input: &Path, output: &Path) -> Result<ReflowReport> {
        if !FileManager::file_exists(input) {
            return Err(anyhow!("Input file does not exist: {:?}", input));
        }
        if FileManager::same_file(input, output) {
            return Err(anyhow!("Output path must differ from input: {:?}", output));
        }

        let sequence = timeline::load(input)?;
        if sequence.is_empty() {
            warn!("No valid entries in {}", input.display());
        }

        let (reflowed, report) = self.reflower()?.reflow_with_report(sequence);
        timeline::save(&reflowed, output, self.config.time_format)?;

        info!(
            "Reflowed {} entries into {} ({} splits): {}",
            report.input_entries,
            report.output_entries,
            report.splits,
            output.display()
        );
        Ok(report)
    }

    /// Copy-or-stretch decision for known durations
    pub fn plan(&self, audio_secs: f64, target_secs: f64) -> Result<Adjustment> {
        Ok(plan_adjustment(audio_secs, target_secs, &self.config.reconcile)?)
    }

    /// Fit an audio file to the span of a timeline file
    pub async fn reconcile<M>(&self, media: M, audio: &Path, timeline_path: &Path, output: &Path) -> Result<ReconcileOutcome>
    where
        M: MediaProbe + MediaTempoTransform,
    {
        let reconciler = DurationReconciler::new(media, self.config.reconcile);
        let outcome = reconciler.reconcile(audio, timeline_path, output).await?;
        Ok(outcome)
    }

    /// Transcribe audio and save the resulting timeline
    pub async fn transcribe(&self, transcriber: &dyn Transcriber, audio: &Path, output: &Path) -> Result<TimedSequence> {
        if !FileManager::file_exists(audio) {
            return Err(anyhow!("Audio file does not exist: {:?}", audio));
        }

        let language = language_utils::normalize_to_part1_or_part2t(&self.config.source_language).ok();
        let sequence = transcriber
            .transcribe(audio, language.as_deref())
            .await
            .with_context(|| format!("Transcription failed for {}", audio.display()))?;

        timeline::save(&sequence, output, self.config.time_format)?;
        info!("Transcribed {} entries to {}", sequence.len(), output.display());
        Ok(sequence)
    }

    /// Run translate -> fillers -> reflow -> speech -> reconcile for one timeline.
    ///
    /// Intermediate files are written to `output_dir` using the input stem.
    /// A failed reconciliation is logged and leaves `adjusted` empty; the
    /// synthesized audio is still returned.
    pub async fn run_pipeline<M>(&self, collaborators: &Collaborators, media: M, input: &Path, output_dir: &Path) -> Result<PipelineArtifacts>
    where
        M: MediaProbe + MediaTempoTransform,
    {
        let start_time = Instant::now();

        if !FileManager::file_exists(input) {
            return Err(anyhow!("Input file does not exist: {:?}", input));
        }
        FileManager::ensure_dir(output_dir)?;

        let sequence = timeline::load(input)?;
        self.dub_sequence(collaborators, media, sequence, input, output_dir, None, start_time)
            .await
    }

    /// Transcribe `audio`, then run the dubbing pipeline on the transcript.
    ///
    /// The transcript is saved as `<stem>.transcribed.srt` in `output_dir` and
    /// every later artifact is named after the audio stem.
    pub async fn run_pipeline_from_audio<M>(
        &self,
        collaborators: &Collaborators,
        transcriber: &dyn Transcriber,
        media: M,
        audio: &Path,
        output_dir: &Path,
    ) -> Result<PipelineArtifacts>
    where
        M: MediaProbe + MediaTempoTransform,
    {
        let start_time = Instant::now();
        FileManager::ensure_dir(output_dir)?;

        let transcript_path = FileManager::generate_output_path(audio, output_dir, "transcribed", "srt");
        let sequence = self.transcribe(transcriber, audio, &transcript_path).await?;

        self.dub_sequence(collaborators, media, sequence, audio, output_dir, Some(transcript_path), start_time)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn dub_sequence<M>(
        &self,
        collaborators: &Collaborators,
        media: M,
        sequence: TimedSequence,
        input: &Path,
        output_dir: &Path,
        transcript: Option<PathBuf>,
        start_time: Instant,
    ) -> Result<PipelineArtifacts>
    where
        M: MediaProbe + MediaTempoTransform,
    {
        if sequence.is_empty() {
            return Err(TimelineError::Empty.into());
        }

        let source_name = display_language(&self.config.source_language);
        let target_name = display_language(&self.config.target_language);

        // Translation
        let service = {
            let service = TranslationService::new(
                collaborators.translator.clone(),
                &source_name,
                &target_name,
                self.config.translation.concurrent_requests,
            );
            match (&collaborators.filler, self.config.translation.add_fillers) {
                (Some(filler), true) => service.with_filler(filler.clone()),
                _ => service,
            }
        };

        let progress_bar = entry_progress_bar(sequence.len() as u64, "Translating");
        let (translated, summary) = service
            .translate_sequence(&sequence, |done, _| progress_bar.set_position(done as u64))
            .await;
        progress_bar.finish_and_clear();

        let translated_path = FileManager::generate_output_path(input, output_dir, "translated", "srt");
        timeline::save(&translated, &translated_path, self.config.time_format)?;
        info!(
            "Translated {} entries ({} kept original text): {}",
            summary.translated,
            summary.fallbacks,
            translated_path.display()
        );

        // Filler words
        let (enriched, filled_path) = if self.config.translation.add_fillers && collaborators.filler.is_some() {
            let (filled, _) = service.add_filler_words(&translated).await;
            let path = FileManager::generate_output_path(input, output_dir, "filled", "srt");
            timeline::save(&filled, &path, self.config.time_format)?;
            (filled, Some(path))
        } else {
            (translated, None)
        };

        // Reflow
        let (reflowed, reflow_report) = self.reflower()?.reflow_with_report(enriched);
        let reflowed_path = FileManager::generate_output_path(input, output_dir, "merged", "srt");
        timeline::save(&reflowed, &reflowed_path, self.config.time_format)?;
        info!(
            "Merged {} entries into {}: {}",
            reflow_report.input_entries,
            reflow_report.output_entries,
            reflowed_path.display()
        );

        // Speech
        let audio_path = FileManager::generate_output_path(input, output_dir, "speech", "mp3");
        let voice = VoiceParams::from(&self.config.speech);
        let text = narration_text(&reflowed);
        debug!("Narration text has {} words", reflowed.total_words());
        collaborators
            .speech
            .synthesize(&text, &voice, &audio_path)
            .await
            .context("Speech synthesis failed")?;
        info!("Generated audio: {}", audio_path.display());

        // Reconcile
        let adjusted_path = FileManager::generate_output_path(input, output_dir, "adjusted", "mp3");
        let reconciler = DurationReconciler::new(media, self.config.reconcile);
        let adjusted = match reconciler.reconcile(&audio_path, &reflowed_path, &adjusted_path).await {
            Ok(outcome) => {
                info!("Timing-adjusted audio: {}", outcome.output.display());
                Some(outcome)
            }
            Err(e) => {
                error!("Audio adjustment failed at {} stage: {}", e.stage(), e);
                None
            }
        };

        info!("Dubbing finished in {:.1}s", start_time.elapsed().as_secs_f64());

        Ok(PipelineArtifacts {
            transcript,
            translated: translated_path,
            filled: filled_path,
            reflowed: reflowed_path,
            audio: audio_path,
            adjusted,
            reflow_report,
        })
    }

    /// Reflow every timeline file under `input_dir` into `output_dir`
    pub fn run_folder(&self, input_dir: &Path, output_dir: &Path, force_overwrite: bool) -> Result<BatchSummary> {
        let start_time = Instant::now();

        if !FileManager::dir_exists(input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }
        FileManager::ensure_dir(output_dir)?;

        // Outputs of an earlier run are not inputs
        let files: Vec<PathBuf> = FileManager::find_files(input_dir, &TIMELINE_EXTENSIONS)?
            .into_iter()
            .filter(|f| !is_reflow_output(f))
            .collect();
        if files.is_empty() {
            warn!("No timeline files found in {}", input_dir.display());
            return Ok(BatchSummary::default());
        }

        let folder_pb = ProgressBar::new(files.len() as u64);
        folder_pb.set_style(bar_style("files"));
        folder_pb.set_message("Reflowing");

        let mut summary = BatchSummary::default();

        for file in &files {
            let output = FileManager::generate_output_path(file, output_dir, REFLOW_SUFFIX, "srt");

            if FileManager::same_file(file, &output) || (output.exists() && !force_overwrite) {
                debug!("Skipping {} (output exists)", file.display());
                summary.skipped += 1;
            } else {
                match self.reflow_file(file, &output) {
                    Ok(_) => summary.processed += 1,
                    Err(e) => {
                        error!("Failed to reflow {}: {}", file.display(), e);
                        summary.failed += 1;
                    }
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_and_clear();

        let message = format!(
            "Batch reflow of {}: {} processed, {} skipped, {} failed in {:.1}s",
            input_dir.display(),
            summary.processed,
            summary.skipped,
            summary.failed,
            start_time.elapsed().as_secs_f64()
        );
        info!("{}", message);
        FileManager::append_to_log_file(output_dir.join(BATCH_LOG_FILE), &message)?;

        Ok(summary)
    }
}

/// Whether `path` is read as a timeline rather than audio
pub fn is_timeline_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            TIMELINE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

fn is_reflow_output(path: &Path) -> bool {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().ends_with(&format!(".{}", REFLOW_SUFFIX)))
        .unwrap_or(false)
}

// Prompts read better with "Spanish" than "es"
fn display_language(code: &str) -> String {
    language_utils::resolve_language_name(code).unwrap_or_else(|_| code.to_string())
}

fn bar_style(unit: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}} {{eta}}",
            unit
        ))
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-")
}

fn entry_progress_bar(len: u64, message: &'static str) -> ProgressBar {
    let progress_bar = ProgressBar::new(len);
    progress_bar.set_style(bar_style("entries"));
    progress_bar.set_message(message);
    progress_bar
}
