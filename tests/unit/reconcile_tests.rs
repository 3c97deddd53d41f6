/*!
 * Tests for stretch planning and the copy-or-stretch run
 */

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smartdub::app_config::ReconcileConfig;
use smartdub::providers::mock::{MediaCall, MockMedia};
use smartdub::{plan_adjustment, Adjustment, DurationReconciler, ReconcileError, ReconcileStage, StretchPlan};
use crate::common;

fn stretch(audio: f64, target: f64) -> StretchPlan {
    match plan_adjustment(audio, target, &ReconcileConfig::default()) {
        Ok(Adjustment::Stretch(plan)) => plan,
        other => panic!("expected stretch for {}/{}, got {:?}", audio, target, other),
    }
}

#[test]
fn test_plan_withElevenSecondsOverTen_shouldStretchByOnePointOne() {
    let plan = stretch(11.0, 10.0);

    assert!((plan.raw_factor - 1.1).abs() < 1e-9);
    assert_eq!(plan.stages.len(), 1);
    assert!((plan.stages[0] - 1.1).abs() < 1e-9);
}

#[test]
fn test_plan_withTenPointThreeOverTen_shouldCopy() -> Result<()> {
    assert_eq!(plan_adjustment(10.3, 10.0, &ReconcileConfig::default())?, Adjustment::Copy);
    Ok(())
}

#[test]
fn test_plan_atThresholdBoundary_shouldCopy() -> Result<()> {
    let config = ReconcileConfig::default();
    assert!(plan_adjustment(10.8, 10.0, &config)?.is_copy());
    assert!(plan_adjustment(9.2, 10.0, &config)?.is_copy());
    assert!(!plan_adjustment(10.81, 10.0, &config)?.is_copy());
    assert!(!plan_adjustment(9.19, 10.0, &config)?.is_copy());
    Ok(())
}

#[test]
fn test_plan_withShortAudio_shouldSlowDownWithinBound() {
    let plan = stretch(4.0, 10.0);

    assert!((plan.raw_factor - 0.4).abs() < 1e-9);
    assert!((plan.factor - 0.9).abs() < 1e-9);
    assert!((plan.product() - 0.9).abs() < 1e-9);
}

#[test]
fn test_plan_withCustomRange_shouldDecomposeWideFactor() {
    let config = ReconcileConfig {
        min_stretch: 0.1,
        max_stretch: 10.0,
        ..ReconcileConfig::default()
    };

    let Ok(Adjustment::Stretch(plan)) = plan_adjustment(50.0, 10.0, &config) else {
        panic!("expected stretch");
    };

    assert_eq!(plan.stages, vec![2.0, 2.0, 1.25]);
    assert!((plan.product() - 5.0).abs() < 1e-9);
}

#[test]
fn test_plan_withNonPositiveDuration_shouldReportComputeStage() {
    let err = plan_adjustment(-1.0, 10.0, &ReconcileConfig::default()).unwrap_err();
    assert!(matches!(err, ReconcileError::InvalidDuration { .. }));
    assert_eq!(err.stage(), ReconcileStage::Compute);
}

#[test]
fn test_plan_withInvertedOrNanRange_shouldFailAtComputeStage() {
    let inverted = ReconcileConfig {
        min_stretch: 1.1,
        max_stretch: 0.9,
        ..ReconcileConfig::default()
    };
    let nan_bound = ReconcileConfig {
        max_stretch: f64::NAN,
        ..ReconcileConfig::default()
    };

    for config in [inverted, nan_bound] {
        let err = plan_adjustment(12.0, 10.0, &config).unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidConfig(_)), "{:?}", err);
        assert_eq!(err.stage(), ReconcileStage::Compute);
    }
}

#[tokio::test]
async fn test_reconciler_withInvertedRange_shouldFailWithoutWriting() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let timeline_path = common::create_test_timeline(temp_dir.path(), "target.srt")?;
    let audio = common::create_test_file(temp_dir.path(), "speech.mp3", "audio")?;
    let config = ReconcileConfig {
        min_stretch: 1.1,
        max_stretch: 0.9,
        ..ReconcileConfig::default()
    };

    let media = MockMedia::with_duration(11.0);
    let result = DurationReconciler::new(&media, config)
        .reconcile(&audio, &timeline_path, &temp_dir.path().join("out.mp3"))
        .await;

    assert!(matches!(result, Err(ref e) if e.stage() == ReconcileStage::Compute));
    assert_eq!(media.calls(), vec![MediaCall::Probe(audio.clone())]);
    Ok(())
}

#[test]
fn test_decompose_withRandomFactors_shouldStayInStageRange() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..1_000 {
        let factor: f64 = rng.random_range(0.01..100.0);
        let stages = StretchPlan::decompose(factor, 0.5, 2.0);

        assert!(!stages.is_empty());
        assert!(stages.iter().all(|s| (0.5..=2.0).contains(s)), "{} -> {:?}", factor, stages);

        let product: f64 = stages.iter().product();
        assert!((product / factor - 1.0).abs() < 1e-9, "{} -> {:?}", factor, stages);
    }
}

#[tokio::test]
async fn test_reconciler_withinThreshold_shouldCopyToGivenPath() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let timeline_path = common::create_test_timeline(temp_dir.path(), "target.srt")?;
    let audio = common::create_test_file(temp_dir.path(), "speech.mp3", "audio")?;
    let output = temp_dir.path().join("out").join("final.mp3");
    std::fs::create_dir_all(temp_dir.path().join("out"))?;

    let reconciler = DurationReconciler::new(MockMedia::with_duration(10.3), ReconcileConfig::default());
    let outcome = reconciler.reconcile(&audio, &timeline_path, &output).await?;

    assert_eq!(outcome.adjustment, Adjustment::Copy);
    assert_eq!(outcome.output, output);
    assert!((outcome.target_secs - 10.0).abs() < 1e-9);
    assert!(output.exists());
    assert_eq!(
        reconciler.media().calls(),
        vec![
            MediaCall::Probe(audio.clone()),
            MediaCall::StreamCopy {
                input: audio.clone(),
                output: output.clone(),
            },
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_reconciler_beyondThreshold_shouldStretchToStampedSibling() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let timeline_path = common::create_test_timeline(temp_dir.path(), "target.srt")?;
    let audio = common::create_test_file(temp_dir.path(), "speech.mp3", "audio")?;
    let output = temp_dir.path().join("final.mp3");

    let media = MockMedia::with_duration(11.0);
    let outcome = DurationReconciler::new(&media, ReconcileConfig::default())
        .reconcile(&audio, &timeline_path, &output)
        .await?;

    assert!(!output.exists());
    assert!(outcome.output.exists());
    assert_eq!(outcome.output.parent(), output.parent());
    assert!(outcome.output.to_string_lossy().ends_with(".mp3"));

    let tempo_calls: Vec<MediaCall> = media
        .calls()
        .into_iter()
        .filter(|c| matches!(c, MediaCall::ApplyTempo { .. }))
        .collect();
    assert_eq!(tempo_calls.len(), 1);
    if let MediaCall::ApplyTempo { stages, output: written, .. } = &tempo_calls[0] {
        assert_eq!(written, &outcome.output);
        assert_eq!(stages.len(), 1);
        assert!((stages[0] - 1.1).abs() < 1e-9);
    }
    Ok(())
}

#[tokio::test]
async fn test_reconciler_withMissingTimeline_shouldReturnFalse() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let audio = common::create_test_file(temp_dir.path(), "speech.mp3", "audio")?;
    let reconciler = DurationReconciler::new(MockMedia::with_duration(10.0), ReconcileConfig::default());

    let adjusted = reconciler
        .adjust_audio_length(&audio, &temp_dir.path().join("missing.srt"), &temp_dir.path().join("out.mp3"))
        .await;

    assert!(!adjusted);
    assert!(reconciler.media().calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_reconciler_withCopyInRange_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let timeline_path = common::create_test_timeline(temp_dir.path(), "target.srt")?;
    let audio = common::create_test_file(temp_dir.path(), "speech.mp3", "audio")?;

    let reconciler = DurationReconciler::new(MockMedia::with_duration(9.5), ReconcileConfig::default());

    assert!(reconciler
        .adjust_audio_length(&audio, &timeline_path, &temp_dir.path().join("out.mp3"))
        .await);
    Ok(())
}
