/*!
 * # smartdub - subtitle reflow and narration timing
 *
 * A Rust library for turning timed subtitles into narration-ready segments
 * and fitting synthesized speech back onto the subtitle timeline.
 *
 * ## Features
 *
 * - Parse and write timed-text files (`HH:MM:SS.mmm` or `HH:MM:SS,mmm`)
 * - Reflow short transcription segments into sentence-aware entries bounded
 *   by a word count, splitting long ones with proportional timing
 * - Reconcile an audio track's duration with its timeline through a bounded
 *   tempo stretch (ffmpeg `atempo`) or a plain stream copy
 * - Optional pipeline around the core: translation and filler words
 *   (OpenAI), speech synthesis (ElevenLabs), transcription (OpenAI)
 *
 * ## Architecture
 *
 * - `timeline`: timed-text model, parser and serializer
 * - `reflow`: merge/split engine
 * - `reconcile`: stretch planning and the copy-or-stretch run
 * - `media`: probe / tempo capabilities and the ffmpeg implementation
 * - `providers`: translation, filler, speech and transcription clients
 * - `translation_service`: sequence-level translation and enrichment
 * - `app_controller`: workflow orchestration
 * - `app_config`, `file_utils`, `language_utils`, `errors`: support
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod media;
pub mod providers;
pub mod reconcile;
pub mod reflow;
pub mod timeline;
pub mod translation_service;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, MediaError, ProviderError, ReconcileError, ReconcileStage, TimelineError};
pub use reconcile::{plan_adjustment, Adjustment, DurationReconciler, ReconcileOutcome, StretchPlan};
pub use reflow::{reflow, ReflowReport, Reflower};
pub use timeline::{TimeFormat, TimedEntry, TimedSequence, Timestamp};
