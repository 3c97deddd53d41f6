/*!
 * Audio duration reconciliation.
 *
 * Given a rendered narration track and the timeline it should fill, compute
 * a time-stretch factor `audio / target`, clip it to a range that still
 * sounds natural and either:
 * - stream-copy the audio unchanged when the clipped factor is close to 1.0
 * - or re-encode it through a chain of tempo stages whose product equals
 *   the clipped factor
 *
 * A run moves through `start -> probe -> parse -> compute -> copy|stretch -> done`;
 * any failure carries the stage it happened in.
 */

use std::path::{Path, PathBuf};

use chrono::Local;
use log::{debug, error, info, warn};

use crate::app_config::ReconcileConfig;
use crate::errors::{ReconcileError, ReconcileStage, TimelineError};
use crate::file_utils::FileManager;
use crate::media::{MediaProbe, MediaTempoTransform};
use crate::timeline;

// Absorbs float noise so that e.g. a factor of exactly 1.08 counts as within 0.08
const THRESHOLD_EPSILON: f64 = 1e-9;

/// A tempo change split into stages the transform accepts
#[derive(Debug, Clone, PartialEq)]
pub struct StretchPlan {
    /// `audio / target` before clipping
    pub raw_factor: f64,

    /// Factor after clipping to the natural-sounding range
    pub factor: f64,

    /// Per-stage multipliers; their product equals `factor`
    pub stages: Vec<f64>,
}

impl StretchPlan {
    /// Break `factor` into multipliers each within `[stage_min, stage_max]`.
    ///
    /// Whole `stage_max` (or `stage_min`) stages are peeled off first and the
    /// remainder is appended last, e.g. `5.0 -> [2.0, 2.0, 1.25]`.
    pub fn decompose(factor: f64, stage_min: f64, stage_max: f64) -> Vec<f64> {
        if !factor.is_finite() || factor <= 0.0 || stage_min <= 0.0 || stage_max <= 1.0 || stage_min >= 1.0 {
            return vec![factor];
        }

        let mut stages = Vec::new();
        let mut remainder = factor;

        while remainder > stage_max {
            stages.push(stage_max);
            remainder /= stage_max;
        }
        while remainder < stage_min {
            stages.push(stage_min);
            remainder /= stage_min;
        }
        stages.push(remainder);

        stages
    }

    /// Product of all stages
    pub fn product(&self) -> f64 {
        self.stages.iter().product()
    }
}

/// What to do with the audio
#[derive(Debug, Clone, PartialEq)]
pub enum Adjustment {
    /// Duration already close enough; copy streams untouched
    Copy,
    /// Re-encode through a tempo chain
    Stretch(StretchPlan),
}

impl Adjustment {
    pub fn is_copy(&self) -> bool {
        matches!(self, Self::Copy)
    }
}

/// Result of a successful reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    /// Probed audio duration in seconds
    pub audio_secs: f64,
    /// Timeline span in seconds
    pub target_secs: f64,
    /// Decision taken
    pub adjustment: Adjustment,
    /// File actually written
    pub output: PathBuf,
}

/// Decide between copy and stretch for the given durations
pub fn plan_adjustment(audio_secs: f64, target_secs: f64, config: &ReconcileConfig) -> Result<Adjustment, ReconcileError> {
    // An inverted or NaN range would make the clamp below panic
    config
        .validate()
        .map_err(|e| ReconcileError::InvalidConfig(e.to_string()))?;

    let valid = |d: f64| d.is_finite() && d > 0.0;
    if !valid(audio_secs) || !valid(target_secs) {
        return Err(ReconcileError::InvalidDuration { audio_secs, target_secs });
    }

    let raw_factor = audio_secs / target_secs;
    let factor = raw_factor.clamp(config.min_stretch, config.max_stretch);

    if factor != raw_factor {
        info!(
            "Stretch factor {:.4} is outside [{}, {}], clipping to {}",
            raw_factor, config.min_stretch, config.max_stretch, factor
        );
    }

    if (factor - 1.0).abs() <= config.fine_threshold + THRESHOLD_EPSILON {
        debug!(
            "Stretch factor {:.4} is within {} of 1.0, no adjustment needed",
            factor, config.fine_threshold
        );
        return Ok(Adjustment::Copy);
    }

    let stages = StretchPlan::decompose(factor, config.stage_min, config.stage_max);
    Ok(Adjustment::Stretch(StretchPlan {
        raw_factor,
        factor,
        stages,
    }))
}

/// Fits an audio track to the span of a timeline
pub struct DurationReconciler<M> {
    media: M,
    config: ReconcileConfig,
}

impl<M> DurationReconciler<M>
where
    M: MediaProbe + MediaTempoTransform,
{
    pub fn new(media: M, config: ReconcileConfig) -> Self {
        Self { media, config }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    /// Reconcile `audio` against the span of the timeline file.
    ///
    /// The copy path writes to `output`; the stretch path writes to a
    /// timestamp-qualified sibling of `output` (`<stem>_<YYYYmmdd_HHMMSS>.<ext>`).
    pub async fn reconcile(&self, audio: &Path, timeline_path: &Path, output: &Path) -> Result<ReconcileOutcome, ReconcileError> {
        debug!("[{}] {} against {}", ReconcileStage::Start, audio.display(), timeline_path.display());

        if !FileManager::file_exists(audio) {
            return Err(ReconcileError::MissingInput(audio.to_path_buf()));
        }
        if !FileManager::file_exists(timeline_path) {
            return Err(ReconcileError::MissingInput(timeline_path.to_path_buf()));
        }
        if FileManager::same_file(audio, output) {
            return Err(ReconcileError::OutputIsSource(output.to_path_buf()));
        }

        let audio_secs = self
            .media
            .probe_duration(audio)
            .await
            .map_err(|source| ReconcileError::Media {
                stage: ReconcileStage::Probe,
                source,
            })?;
        debug!("[{}] audio duration {:.3}s", ReconcileStage::Probe, audio_secs);

        let sequence = timeline::load(timeline_path).map_err(|source| ReconcileError::Timeline {
            stage: ReconcileStage::Parse,
            source,
        })?;
        let target_secs = sequence.span_secs().ok_or(ReconcileError::Timeline {
            stage: ReconcileStage::Parse,
            source: TimelineError::Empty,
        })?;
        debug!("[{}] target duration {:.3}s over {} entries", ReconcileStage::Parse, target_secs, sequence.len());

        let adjustment = plan_adjustment(audio_secs, target_secs, &self.config)?;

        let written = match &adjustment {
            Adjustment::Copy => {
                self.media
                    .stream_copy(audio, output)
                    .await
                    .map_err(|source| ReconcileError::Media {
                        stage: ReconcileStage::Copy,
                        source,
                    })?;
                output.to_path_buf()
            }
            Adjustment::Stretch(plan) => {
                let stretched = FileManager::timestamped_path(output, Local::now());
                if FileManager::same_file(audio, &stretched) {
                    return Err(ReconcileError::OutputIsSource(stretched));
                }

                debug!("[{}] stages {:?} -> {}", ReconcileStage::Stretch, plan.stages, stretched.display());
                self.media
                    .apply_tempo(audio, &stretched, &plan.stages)
                    .await
                    .map_err(|source| ReconcileError::Media {
                        stage: ReconcileStage::Stretch,
                        source,
                    })?;
                stretched
            }
        };

        info!(
            "[{}] audio {:.2}s vs timeline {:.2}s: {} -> {}",
            ReconcileStage::Done,
            audio_secs,
            target_secs,
            match &adjustment {
                Adjustment::Copy => "copied".to_string(),
                Adjustment::Stretch(plan) => format!("stretched by {:.4}", plan.factor),
            },
            written.display()
        );

        Ok(ReconcileOutcome {
            audio_secs,
            target_secs,
            adjustment,
            output: written,
        })
    }

    /// Boolean form of [`reconcile`](Self::reconcile); failures are logged
    pub async fn adjust_audio_length(&self, audio: &Path, timeline_path: &Path, output: &Path) -> bool {
        match self.reconcile(audio, timeline_path, output).await {
            Ok(_) => true,
            Err(e @ ReconcileError::MissingInput(_)) => {
                warn!("Audio adjustment skipped: {}", e);
                false
            }
            Err(e) => {
                error!("Audio adjustment failed at {} stage: {}", e.stage(), e);
                false
            }
        }
    }
}
