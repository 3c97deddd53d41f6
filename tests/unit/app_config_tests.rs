/*!
 * Tests for application configuration
 */

use anyhow::Result;
use smartdub::app_config::{Config, LogLevel, ReconcileConfig, ReflowConfig};
use smartdub::timeline::TimeFormat;

#[test]
fn test_defaultConfig_shouldValidateWithDocumentedBounds() -> Result<()> {
    let config = Config::default();
    config.validate()?;

    assert_eq!(config.reflow, ReflowConfig::new(4, 15));
    assert_eq!(config.reconcile.min_stretch, 0.9);
    assert_eq!(config.reconcile.max_stretch, 1.1);
    assert_eq!(config.reconcile.fine_threshold, 0.08);
    assert_eq!(config.reconcile.stage_min, 0.5);
    assert_eq!(config.reconcile.stage_max, 2.0);
    assert_eq!(config.time_format, TimeFormat::Dotted);
    Ok(())
}

#[test]
fn test_deserialize_withMinimalJson_shouldFillDefaults() -> Result<()> {
    let json = r#"{ "source_language": "en", "target_language": "fr", "time_format": "comma" }"#;

    let config: Config = serde_json::from_str(json)?;

    assert_eq!(config.target_language, "fr");
    assert_eq!(config.time_format, TimeFormat::Comma);
    assert_eq!(config.reflow, ReflowConfig::default());
    assert_eq!(config.reconcile, ReconcileConfig::default());
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.translation.add_fillers);
    config.validate()?;
    Ok(())
}

#[test]
fn test_serializeRoundTrip_shouldKeepCustomValues() -> Result<()> {
    let mut config = Config::default();
    config.reflow = ReflowConfig::new(2, 8);
    config.reconcile.fine_threshold = 0.05;
    config.log_level = LogLevel::Debug;

    let json = serde_json::to_string_pretty(&config)?;
    let restored: Config = serde_json::from_str(&json)?;

    assert_eq!(restored.reflow, config.reflow);
    assert_eq!(restored.reconcile, config.reconcile);
    assert_eq!(restored.log_level, LogLevel::Debug);
    Ok(())
}

#[test]
fn test_validate_withBadReflowBounds_shouldFail() {
    let mut config = Config::default();
    config.reflow = ReflowConfig::new(10, 5);
    assert!(config.validate().is_err());

    config.reflow = ReflowConfig::new(0, 0);
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withBadReconcileBounds_shouldFail() {
    let mut config = Config::default();
    config.reconcile.min_stretch = 1.2;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.reconcile.stage_max = 1.0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.reconcile.fine_threshold = f64::NAN;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withUnknownLanguageOrEndpoint_shouldFail() {
    let mut config = Config::default();
    config.target_language = "Elvish".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.source_language = "xx".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.speech.endpoint = "not a url".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.translation.concurrent_requests = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_serviceValidation_shouldRequireKeys() {
    let mut config = Config::default();
    assert!(config.validate_for_translation().is_err());
    assert!(config.validate_for_speech().is_err());
    assert!(config.validate_for_transcription().is_err());

    config.translation.api_key = "sk-test".to_string();
    config.speech.api_key = "xi-test".to_string();
    assert!(config.validate_for_translation().is_ok());
    assert!(config.validate_for_speech().is_ok());
    assert!(config.validate_for_transcription().is_ok());
    assert_eq!(config.transcription_api_key(), "sk-test");

    config.transcription.api_key = "sk-whisper".to_string();
    assert_eq!(config.transcription_api_key(), "sk-whisper");
}

#[test]
fn test_logLevel_shouldMapToFilter() {
    assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}
