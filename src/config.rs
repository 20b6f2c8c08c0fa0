use std::fs;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::probe::{MIN_PROBE_DELAY, ProbePolicy};
use crate::schema::SchemaPreset;

pub const CONFIG_FILE_NAME: &str = "hubmap-catalog.json";
pub const DEFAULT_REGISTRY_BASE: &str = "https://search.api.hubmapconsortium.org";
pub const DEFAULT_ASSETS_BASE: &str = "https://assets.hubmapconsortium.org";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub registry_base: Option<String>,
    #[serde(default)]
    pub assets_base: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub probe_timeout_secs: Option<u64>,
    #[serde(default)]
    pub probe_attempts: Option<u32>,
    #[serde(default)]
    pub probe_delay_ms: Option<u64>,
    #[serde(default)]
    pub schema: Option<SchemaPreset>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub registry_base: String,
    pub assets_base: String,
    pub request_timeout: Duration,
    pub probe_timeout: Duration,
    pub probe_policy: ProbePolicy,
    pub schema: SchemaPreset,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            registry_base: DEFAULT_REGISTRY_BASE.to_string(),
            assets_base: DEFAULT_ASSETS_BASE.to_string(),
            request_timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(5),
            probe_policy: ProbePolicy::default(),
            schema: SchemaPreset::SingleCell,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// An explicit path must exist; otherwise the working directory and then
    /// the user config directory are searched, falling back to defaults.
    pub fn resolve(path: Option<&Utf8Path>) -> Result<ResolvedConfig, CatalogError> {
        let config_path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover(),
        };

        let Some(config_path) = config_path else {
            tracing::debug!("no config file found, using defaults");
            return Ok(ResolvedConfig::default());
        };

        let content = fs::read_to_string(config_path.as_std_path())
            .map_err(|_| CatalogError::ConfigRead(config_path.clone().into_std_path_buf()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| CatalogError::ConfigParse(err.to_string()))?;
        tracing::debug!(path = %config_path, "loaded config");

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, CatalogError> {
        let defaults = ResolvedConfig::default();

        let registry_base = validate_base_url(
            "registry_base",
            config.registry_base.unwrap_or(defaults.registry_base),
        )?;
        let assets_base = validate_base_url(
            "assets_base",
            config.assets_base.unwrap_or(defaults.assets_base),
        )?;

        let attempts = config
            .probe_attempts
            .unwrap_or(defaults.probe_policy.attempts);
        if attempts == 0 {
            return Err(CatalogError::InvalidConfig(
                "probe_attempts must be at least 1".to_string(),
            ));
        }

        let delay = config
            .probe_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.probe_policy.delay);
        if delay < MIN_PROBE_DELAY {
            return Err(CatalogError::InvalidConfig(format!(
                "probe_delay_ms must be at least {}",
                MIN_PROBE_DELAY.as_millis()
            )));
        }

        Ok(ResolvedConfig {
            registry_base,
            assets_base,
            request_timeout: config
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            probe_timeout: config
                .probe_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.probe_timeout),
            probe_policy: ProbePolicy { attempts, delay },
            schema: config.schema.unwrap_or(defaults.schema),
        })
    }

    fn discover() -> Option<Utf8PathBuf> {
        let local = Utf8PathBuf::from(CONFIG_FILE_NAME);
        if local.as_std_path().exists() {
            return Some(local);
        }
        BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(
                    dirs.config_dir().join("hubmap-catalog").join("config.json"),
                )
                .ok()
            })
            .filter(|path| path.as_std_path().exists())
    }
}

fn validate_base_url(key: &str, value: String) -> Result<String, CatalogError> {
    let trimmed = value.trim().trim_end_matches('/');
    if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
        return Err(CatalogError::InvalidConfig(format!(
            "{key} must be an http(s) URL, got {value}"
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
        assert_eq!(resolved.registry_base, DEFAULT_REGISTRY_BASE);
        assert_eq!(resolved.assets_base, DEFAULT_ASSETS_BASE);
        assert_eq!(resolved.probe_policy.attempts, 3);
        assert_eq!(resolved.probe_policy.delay, Duration::from_millis(500));
        assert_eq!(resolved.schema, SchemaPreset::SingleCell);
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = Config {
            assets_base: Some("https://assets.example.org/".to_string()),
            ..Config::default()
        };
        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.assets_base, "https://assets.example.org");
    }

    #[test]
    fn rejects_short_probe_delay() {
        let config = Config {
            probe_delay_ms: Some(100),
            ..Config::default()
        };
        let err = ConfigLoader::resolve_config(config).unwrap_err();
        assert_matches!(err, CatalogError::InvalidConfig(_));
    }
}
