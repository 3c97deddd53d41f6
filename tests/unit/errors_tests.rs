/*!
 * Tests for error types and conversions
 */

use std::path::PathBuf;

use smartdub::errors::{AppError, MediaError, ProviderError, ReconcileError, ReconcileStage, TimelineError};

#[test]
fn test_providerError_display_shouldIncludeDetails() {
    let err = ProviderError::ApiError {
        status_code: 429,
        message: "rate limited".to_string(),
    };
    assert_eq!(err.to_string(), "API responded with error: 429 - rate limited");

    let err = ProviderError::AuthenticationError("bad key".to_string());
    assert_eq!(err.to_string(), "Authentication error: bad key");
}

#[test]
fn test_timelineError_display_shouldDescribeBlock() {
    assert_eq!(
        TimelineError::MissingArrow("00:00:01.000 00:00:02.000".to_string()).to_string(),
        "Missing '-->' separator in timing line: '00:00:01.000 00:00:02.000'"
    );
    assert_eq!(
        TimelineError::InvalidBounds { min_words: 9, max_words: 3 }.to_string(),
        "Invalid word bounds: min_words=9, max_words=3"
    );
}

#[test]
fn test_reconcileError_stage_shouldFollowVariant() {
    let missing = ReconcileError::MissingInput(PathBuf::from("a.mp3"));
    assert_eq!(missing.stage(), ReconcileStage::Start);

    let probe = ReconcileError::Media {
        stage: ReconcileStage::Probe,
        source: MediaError::Timeout {
            tool: "ffprobe".to_string(),
            secs: 5,
        },
    };
    assert_eq!(probe.stage(), ReconcileStage::Probe);
    assert_eq!(probe.to_string(), "Media failure during probe: ffprobe timed out after 5 seconds");

    let parse = ReconcileError::Timeline {
        stage: ReconcileStage::Parse,
        source: TimelineError::Empty,
    };
    assert_eq!(parse.stage(), ReconcileStage::Parse);
}

#[test]
fn test_reconcileError_shouldExposeSource() {
    use std::error::Error;

    let err = ReconcileError::Media {
        stage: ReconcileStage::Stretch,
        source: MediaError::InvalidTempo("no tempo stages".to_string()),
    };

    let source = err.source().map(|s| s.to_string());
    assert_eq!(source.as_deref(), Some("Invalid tempo chain: no tempo stages"));
}

#[test]
fn test_appError_conversions_shouldWrapInner() {
    let app: AppError = TimelineError::Empty.into();
    assert!(matches!(app, AppError::Timeline(TimelineError::Empty)));
    assert_eq!(app.to_string(), "Timeline error: Timeline contains no entries");

    let app: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(app, AppError::File(_)));

    let app: AppError = anyhow::anyhow!("boom").into();
    assert_eq!(app.to_string(), "Unknown error: boom");
}

#[test]
fn test_stageDisplay_shouldBeLowercase() {
    let names: Vec<String> = [
        ReconcileStage::Start,
        ReconcileStage::Probe,
        ReconcileStage::Parse,
        ReconcileStage::Compute,
        ReconcileStage::Copy,
        ReconcileStage::Stretch,
        ReconcileStage::Done,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    assert_eq!(names, vec!["start", "probe", "parse", "compute", "copy", "stretch", "done"]);
}
