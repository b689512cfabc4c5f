//! End-to-end layering: file overrides defaults, then `validate` rejects
//! a semantically invalid merged result.

use std::collections::HashMap;

use vellum_config::{AppConfig, ConfigError, apply_env_overrides, load};

#[test]
fn file_and_env_layer_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("vellum.toml");
    std::fs::write(
        &path,
        "[storage]\ndatabase_path = \"/data/vellum.sqlite3\"\n\n[media]\nmax_concurrent_operations = 8\n",
    )
    .expect("write config");

    let mut config = load(&path).expect("load layered config");
    assert_eq!(config.storage.database_path, "/data/vellum.sqlite3");
    assert_eq!(config.media.max_concurrent_operations, 8);
    // Fields the file didn't mention still come from AppConfig::default().
    assert_eq!(config.transcription, AppConfig::default().transcription);

    let mut env = HashMap::new();
    env.insert(
        "VELLUM_MEDIA_MAX_CONCURRENT_OPERATIONS".to_string(),
        "2".to_string(),
    );
    apply_env_overrides(&mut config, |key| env.get(key).cloned()).expect("env override");
    assert_eq!(config.media.max_concurrent_operations, 2);
}

#[test]
fn invalid_merged_config_fails_validation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("vellum.toml");
    std::fs::write(&path, "[retry]\njitter_factor = 4.0\n").expect("write config");

    let err = load(&path).expect_err("invalid jitter factor should fail validation");
    assert!(matches!(
        err,
        ConfigError::InvalidField {
            field: "retry.jitter_factor",
            ..
        }
    ));
}
