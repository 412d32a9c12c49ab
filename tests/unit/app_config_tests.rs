/*!
 * Tests for app configuration functionality
 */

use anyhow::Result;
use std::fs;
use std::time::Duration;
use quickcut::app_config::{Config, LogLevel, SessionConfig};
use crate::common;

/// Test the defaults describe a working setup
#[test]
fn test_default_shouldTryFfmpegThenAvconv() -> Result<()> {
    let config = Config::default();

    assert_eq!(config.tool.candidates, vec!["ffmpeg".to_string(), "avconv".to_string()]);
    assert_eq!(config.tool.timeout(), Some(Duration::from_secs(3600)));
    assert!(config.open_result);
    assert!(!config.opener_candidates.is_empty());
    assert_eq!(config.log_level, LogLevel::Info);
    config.validate()?;
    Ok(())
}

/// Test a zero timeout disables the limit
#[test]
fn test_timeout_withZero_shouldBeDisabled() {
    let mut config = Config::default();
    config.tool.timeout_secs = 0;
    assert_eq!(config.tool.timeout(), None);
}

/// Test missing fields fall back to their defaults
#[test]
fn test_deserialize_withPartialJson_shouldFillDefaults() -> Result<()> {
    let config: Config = serde_json::from_str(r#"{ "open_result": false, "log_level": "debug" }"#)?;

    assert!(!config.open_result);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.tool, Config::default().tool);
    assert_eq!(config.session.last_dir, None);
    Ok(())
}

/// Test validation rejects a config with no usable tool
#[test]
fn test_validate_withBlankCandidates_shouldFail() {
    let mut config = Config::default();
    config.tool.candidates = vec!["  ".to_string()];
    assert!(config.validate().is_err());
}

/// Test a missing config file is created with the defaults
#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("nested").join("config.json");

    let config = Config::load_or_create(&path)?;

    assert!(path.exists());
    assert_eq!(config, Config::default());
    assert_eq!(Config::load_or_create(&path)?, config);
    Ok(())
}

/// Test the remembered directory survives a save
#[test]
fn test_save_withSession_shouldPersistLastDir() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("config.json");

    let mut config = Config::default();
    config.session.remember(temp_dir.path());
    config.save(&path)?;

    let reloaded = Config::load_or_create(&path)?;
    assert_eq!(reloaded.session.last_dir.as_deref(), Some(temp_dir.path()));
    assert_eq!(reloaded.session.start_dir(), temp_dir.path());
    Ok(())
}

/// Test a broken file is reported instead of overwritten
#[test]
fn test_load_or_create_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "config.json", "{ not json")?;

    assert!(Config::load_or_create(&path).is_err());
    assert_eq!(fs::read_to_string(&path)?, "{ not json");
    Ok(())
}

/// Test a stale directory falls back to somewhere that exists
#[test]
fn test_start_dir_withVanishedDir_shouldFallBack() {
    let session = SessionConfig {
        last_dir: Some("/definitely/not/here".into()),
    };
    assert_ne!(session.start_dir(), std::path::PathBuf::from("/definitely/not/here"));
}
