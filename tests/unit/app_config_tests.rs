/*!
 * Tests for configuration loading and validation
 */

use std::fs;
use std::time::Duration;

use course_localizer::app_config::{Config, LogLevel};
use course_localizer::course::VersionPolicy;

use crate::common::create_temp_dir;

#[test]
fn test_load_or_create_withPartialFile_shouldFillDefaults() {
    let temp = create_temp_dir().unwrap();
    let path = temp.path().join("conf.json");
    fs::write(
        &path,
        r#"{
            "source_language": "fr",
            "target_languages": ["en", "es"],
            "retry": { "max_retries": 3, "retry_delay_ms": 250 },
            "layout": { "create_new_version": true },
            "log_level": "debug"
        }"#,
    )
    .unwrap();

    let (config, created) = Config::load_or_create(&path).unwrap();

    assert!(!created);
    assert_eq!(config.source_language, "fr");
    assert_eq!(config.target_languages, vec!["en", "es"]);
    assert_eq!(config.retry.policy().max_retries, 3);
    assert_eq!(config.retry.policy().retry_delay, Duration::from_millis(250));
    assert_eq!(config.layout.version_policy(), VersionPolicy::CreateNew);
    assert_eq!(config.layout.document_ext, "pptx");
    assert_eq!(config.log_level, LogLevel::Debug);
    assert!(config.validate().is_ok());
}

#[test]
fn test_load_or_create_withInvalidJson_shouldFail() {
    let temp = create_temp_dir().unwrap();
    let path = temp.path().join("conf.json");
    fs::write(&path, "{ not json").unwrap();

    assert!(Config::load_or_create(&path).is_err());
}

#[test]
fn test_default_config_shouldReuseLatestVersion() {
    let config = Config::default();
    assert_eq!(config.layout.version_policy(), VersionPolicy::ReuseLatest);
    assert_eq!(config.transcription.max_upload_mb, 20);
    assert_eq!(config.assembly.assembly_config().group_size, 20);
}

#[test]
fn test_validate_withZeroWorkers_shouldFail() {
    let mut config = Config::default();
    config.concurrency.max_workers = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withTargetEqualToSource_shouldFail() {
    let mut config = Config::default();
    config.target_languages = vec!["en".to_string()];
    assert!(config.validate().is_err());
}

#[test]
fn test_require_api_keys_shouldNameMissingKey() {
    let config = Config::default().with_secrets(|name| match name {
        "API_KEY_ANTHROPIC" => Some("a".to_string()),
        "API_KEY_OPENAI" => Some("b".to_string()),
        _ => None,
    });

    let error = config.require_api_keys().unwrap_err();
    assert!(error.to_string().contains("ELEVENLABS_API_KEY"));
}

#[test]
fn test_save_shouldRoundTripThroughLoad() {
    let temp = create_temp_dir().unwrap();
    let path = temp.path().join("conf.json");
    let mut config = Config::default();
    config.target_languages = vec!["de".to_string()];
    config.speech.stability = 0.7;

    config.save(&path).unwrap();
    let (loaded, _) = Config::load_or_create(&path).unwrap();

    assert_eq!(loaded.target_languages, vec!["de"]);
    assert_eq!(loaded.speech.voice_settings().stability, 0.7);
}
