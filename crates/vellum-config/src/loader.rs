//! Layered configuration loading: defaults, overridden by an optional
//! TOML file, overridden by a curated set of environment variables.

use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::model::AppConfig;

/// Environment variable prefix recognized by [`apply_env_overrides`].
pub const ENV_PREFIX: &str = "VELLUM_";

/// Load configuration from `path` (if it exists) layered over
/// [`AppConfig::default`], then apply environment variable overrides, then
/// validate the result.
///
/// A missing file is not an error: the defaults (plus any environment
/// overrides) are used as-is, matching a fresh install with no config
/// file written yet.
///
/// # Errors
///
/// Returns [`ConfigError::Read`] if the file exists but cannot be read,
/// [`ConfigError::Parse`] if its contents are not valid TOML,
/// [`ConfigError::InvalidEnvOverride`] if an environment override cannot
/// be parsed, or a validation error from [`AppConfig::validate`].
pub fn load(path: &Path) -> ConfigResult<AppConfig> {
    let mut config = if path.exists() {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?
    } else {
        tracing::info!(path = %path.display(), "no configuration file found; using defaults");
        AppConfig::default()
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Apply environment variable overrides on top of an already-loaded
/// config.
///
/// `lookup` is injected so tests can supply a fake environment instead of
/// mutating the process's real one.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvOverride`] if a recognized variable's
/// value cannot be parsed into the field's type.
pub fn apply_env_overrides(
    config: &mut AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> ConfigResult<()> {
    macro_rules! override_field {
        ($key:literal, $field:expr, $parse:expr) => {
            if let Some(raw) = lookup(concat!("VELLUM_", $key)) {
                $field = $parse(&raw).ok_or_else(|| ConfigError::InvalidEnvOverride {
                    key: concat!("VELLUM_", $key).to_string(),
                    value: raw.clone(),
                })?;
            }
        };
    }

    override_field!(
        "DOWNLOAD_MAX_CONCURRENT_DOWNLOADS",
        config.download.max_concurrent_downloads,
        |s: &str| s.parse().ok()
    );
    override_field!(
        "DOWNLOAD_VERIFY_SSL",
        config.download.verify_ssl,
        |s: &str| s.parse().ok()
    );
    override_field!(
        "MODELS_DIR",
        config.models.models_dir,
        |s: &str| Some(s.to_string())
    );
    override_field!(
        "MODELS_MAX_CONCURRENT_DOWNLOADS",
        config.models.max_concurrent_downloads,
        |s: &str| s.parse().ok()
    );
    override_field!(
        "TRANSCRIPTION_GPU_ENABLED",
        config.transcription.gpu_enabled,
        |s: &str| s.parse().ok()
    );
    override_field!(
        "TRANSCRIPTION_MAX_CONCURRENT",
        config.transcription.max_concurrent_transcriptions,
        |s: &str| s.parse().ok()
    );
    override_field!(
        "MEDIA_TEMP_DIR",
        config.media.temp_dir,
        |s: &str| Some(s.to_string())
    );
    override_field!(
        "MEDIA_MAX_CONCURRENT_OPERATIONS",
        config.media.max_concurrent_operations,
        |s: &str| s.parse().ok()
    );
    override_field!(
        "RECOVERY_AUTO_RECOVERY_ENABLED",
        config.recovery.auto_recovery_enabled,
        |s: &str| s.parse().ok()
    );
    override_field!(
        "STORAGE_DATABASE_PATH",
        config.storage.database_path,
        |s: &str| Some(s.to_string())
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_yields_defaults() {
        let config = load(Path::new("/nonexistent/vellum.toml")).expect("defaults load");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_merges_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("vellum.toml");
        std::fs::write(&path, "[download]\nmax_concurrent_downloads = 7\n").expect("write");
        let config = load(&path).expect("load");
        assert_eq!(config.download.max_concurrent_downloads, 7);
        assert_eq!(config.models, AppConfig::default().models);
    }

    #[test]
    fn invalid_toml_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("vellum.toml");
        std::fs::write(&path, "not valid toml [[[").expect("write");
        assert!(matches!(load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn env_override_applies_and_validates_type() {
        let mut env = HashMap::new();
        env.insert(
            "VELLUM_DOWNLOAD_MAX_CONCURRENT_DOWNLOADS".to_string(),
            "9".to_string(),
        );
        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, |key| env.get(key).cloned()).expect("override");
        assert_eq!(config.download.max_concurrent_downloads, 9);
    }

    #[test]
    fn invalid_env_override_is_reported() {
        let mut env = HashMap::new();
        env.insert(
            "VELLUM_DOWNLOAD_MAX_CONCURRENT_DOWNLOADS".to_string(),
            "not-a-number".to_string(),
        );
        let mut config = AppConfig::default();
        let result = apply_env_overrides(&mut config, |key| env.get(key).cloned());
        assert!(matches!(result, Err(ConfigError::InvalidEnvOverride { .. })));
    }
}
