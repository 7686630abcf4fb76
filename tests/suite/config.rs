//! Config files on disk feeding the core policy types.

use std::fs;

use settle_config::{ConfigError, DEFAULT_LIMIT, SettleConfig};
use settle_core::RetryPolicy;
use tempfile::tempdir;

#[test]
fn config_file_drives_retry_and_schedule() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "[retry]\nretries = 1\ntimeout_ms = 250\n\n[schedule]\nlimit = 8\n",
    )
    .unwrap();

    let config = SettleConfig::load_from(&path).unwrap().unwrap();
    let policy = config.retry_policy().unwrap();
    assert_eq!(policy.retries(), 1);
    assert_eq!(policy.max_attempts(), 2);
    assert_eq!(policy.timeout().as_millis(), 250);
    assert_eq!(policy.delay(), RetryPolicy::default().delay());
    assert_eq!(config.schedule_limit().unwrap().get(), 8);
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[log]\nfilter = \"debug\"\n").unwrap();

    let config = SettleConfig::load_from(&path).unwrap().unwrap();
    assert_eq!(config.retry_policy().unwrap(), RetryPolicy::default());
    assert_eq!(config.schedule_limit().unwrap(), DEFAULT_LIMIT);
    assert_eq!(config.log_filter(), Some("debug"));
}

#[test]
fn malformed_file_reports_its_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[schedule]\nlimit = \"many\"\n").unwrap();

    let err = SettleConfig::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert_eq!(err.path(), Some(path.as_path()));
    assert!(err.to_string().contains("config.toml"));
}
