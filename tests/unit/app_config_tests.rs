/*!
 * Tests for configuration loading and validation
 */

use bisubs::app_config::{MergeConfig, OutputFormat, SyncStrategy};

use crate::common;

#[test]
fn test_from_file_withPartialJson_shouldFillDefaults() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(
        dir.path(),
        "conf.json",
        r#"{"output_format": "ass", "alignment_threshold": 0.3}"#,
    )
    .unwrap();

    let config = MergeConfig::from_file(&path).unwrap();
    assert_eq!(config.output_format, OutputFormat::Ass);
    assert_eq!(config.alignment_threshold, 0.3);
    assert_eq!(config.primary_language, "zh");
    assert_eq!(config.sync_strategy, SyncStrategy::Auto);
}

#[test]
fn test_from_file_withInvalidValues_shouldFailValidation() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(
        dir.path(),
        "conf.json",
        r#"{"alignment_threshold": 7.0}"#,
    )
    .unwrap();
    assert!(MergeConfig::from_file(&path).is_err());
}

#[test]
fn test_create_default_file_shouldRoundTrip() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");
    let created = MergeConfig::create_default_file(&path).unwrap();
    let loaded = MergeConfig::from_file(&path).unwrap();
    assert_eq!(created.primary_language, loaded.primary_language);
    assert_eq!(created.time_threshold_ms, loaded.time_threshold_ms);
}

#[test]
fn test_validate_shouldRejectSameLanguagePair() {
    let config = MergeConfig {
        primary_language: "en".to_string(),
        secondary_language: "eng".to_string(),
        ..MergeConfig::default()
    };
    assert!(config.validate().is_err());
}
