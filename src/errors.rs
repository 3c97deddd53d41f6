/*!
 * Error types for the smartdub application.
 *
 * This module contains custom error types for the different parts of the
 * dubbing pipeline, using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use std::fmt;

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Error writing a produced artifact (e.g. synthesized audio)
    #[error("Output error: {0}")]
    OutputError(String),
}

/// Errors that can occur while reading, writing or reflowing timed text
#[derive(Error, Debug)]
pub enum TimelineError {
    /// A block has fewer than the two mandatory lines
    #[error("Block has {0} line(s), expected at least 2")]
    TooFewLines(usize),

    /// The first line of a block is not an integer
    #[error("Invalid index line: '{0}'")]
    InvalidIndex(String),

    /// The timing line has no `-->` separator
    #[error("Missing '-->' separator in timing line: '{0}'")]
    MissingArrow(String),

    /// A timestamp could not be parsed
    #[error("Invalid timestamp: '{0}'")]
    InvalidTimestamp(String),

    /// End time is before start time
    #[error("Invalid time range: {start} --> {end}")]
    InvalidRange {
        /// Formatted start time
        start: String,
        /// Formatted end time
        end: String,
    },

    /// The block carries no text
    #[error("Entry has no text")]
    EmptyText,

    /// The timeline contains no entries
    #[error("Timeline contains no entries")]
    Empty,

    /// Reflow word bounds are unusable
    #[error("Invalid word bounds: min_words={min_words}, max_words={max_words}")]
    InvalidBounds {
        /// Minimum words per entry
        min_words: usize,
        /// Maximum words per entry
        max_words: usize,
    },

    /// Reading or writing a timeline file failed
    #[error("Timeline file error for {path:?}: {message}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error text
        message: String,
    },
}

/// Errors raised by the external media tools (probe / tempo transform)
#[derive(Error, Debug)]
pub enum MediaError {
    /// The tool binary could not be started
    #[error("Failed to execute {tool}: {message}")]
    Spawn {
        /// Tool name
        tool: String,
        /// Spawn error text
        message: String,
    },

    /// The tool exceeded the configured timeout
    #[error("{tool} timed out after {secs} seconds")]
    Timeout {
        /// Tool name
        tool: String,
        /// Timeout in seconds
        secs: u64,
    },

    /// The tool exited with a non-zero status
    #[error("{tool} failed (exit code {code:?}): {stderr}")]
    Failed {
        /// Tool name
        tool: String,
        /// Exit code if any
        code: Option<i32>,
        /// Filtered diagnostic output
        stderr: String,
    },

    /// The tool output could not be interpreted
    #[error("Unparseable {tool} output: '{output}'")]
    UnparseableOutput {
        /// Tool name
        tool: String,
        /// Raw output
        output: String,
    },

    /// A tempo chain was requested with no stages or an invalid stage
    #[error("Invalid tempo chain: {0}")]
    InvalidTempo(String),
}

/// Stage of a reconciliation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileStage {
    Start,
    Probe,
    Parse,
    Compute,
    Copy,
    Stretch,
    Done,
}

impl fmt::Display for ReconcileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Probe => "probe",
            Self::Parse => "parse",
            Self::Compute => "compute",
            Self::Copy => "copy",
            Self::Stretch => "stretch",
            Self::Done => "done",
        };
        write!(f, "{}", name)
    }
}

/// Errors that can occur while reconciling audio against a timeline
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// An input file does not exist
    #[error("Input file not found: {0:?}")]
    MissingInput(PathBuf),

    /// Output would overwrite the source audio
    #[error("Output path must differ from the source audio: {0:?}")]
    OutputIsSource(PathBuf),

    /// A media tool failed at the given stage
    #[error("Media failure during {stage}: {source}")]
    Media {
        /// Stage where the failure occurred
        stage: ReconcileStage,
        /// Underlying media error
        #[source]
        source: MediaError,
    },

    /// The target timeline could not be used
    #[error("Timeline failure during {stage}: {source}")]
    Timeline {
        /// Stage where the failure occurred
        stage: ReconcileStage,
        /// Underlying timeline error
        #[source]
        source: TimelineError,
    },

    /// A duration is zero, negative or not finite
    #[error("Invalid duration: audio={audio_secs}s, target={target_secs}s")]
    InvalidDuration {
        /// Probed audio duration in seconds
        audio_secs: f64,
        /// Target timeline duration in seconds
        target_secs: f64,
    },

    /// The stretch or stage bounds are unusable
    #[error("Invalid reconcile configuration: {0}")]
    InvalidConfig(String),
}

impl ReconcileError {
    /// Stage in which the failure happened
    pub fn stage(&self) -> ReconcileStage {
        match self {
            Self::MissingInput(_) | Self::OutputIsSource(_) => ReconcileStage::Start,
            Self::Media { stage, .. } | Self::Timeline { stage, .. } => *stage,
            Self::InvalidDuration { .. } | Self::InvalidConfig(_) => ReconcileStage::Compute,
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from timeline processing
    #[error("Timeline error: {0}")]
    Timeline(#[from] TimelineError),

    /// Error from a media tool
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// Error from audio reconciliation
    #[error("Reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
