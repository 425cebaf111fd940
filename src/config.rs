use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

use crate::audit::{AuditOptions, DEFAULT_TOP_ARTISTS};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Application configuration loaded from TOML config file.
/// The config file is optional; every field has a default.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub audit: AuditConfig,
    pub listenbrainz: ListenBrainzConfig,
}

/// Defaults for the `audit` command.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Near-duplicate window in seconds. 0 disables the check.
    pub near_window: u64,
    /// Number of artists in the top-artists table.
    pub top_artists: usize,
    /// Drop podcast episodes before auditing.
    pub exclude_podcasts: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            near_window: 0,
            top_artists: DEFAULT_TOP_ARTISTS,
            exclude_podcasts: false,
        }
    }
}

/// ListenBrainz API settings for the `export` command.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ListenBrainzConfig {
    pub api_root: String,
    /// Listens requested per page (the API caps this at 1000).
    pub batch_size: usize,
    /// Pause between page requests in milliseconds.
    pub rate_limit_ms: u64,
    pub max_retries: u32,
    pub username: Option<String>,
    pub token: Option<String>,
}

impl Default for ListenBrainzConfig {
    fn default() -> Self {
        Self {
            api_root: "https://api.listenbrainz.org/1".to_string(),
            batch_size: 1000,
            rate_limit_ms: 500,
            max_retries: 5,
            username: None,
            token: None,
        }
    }
}

impl AppConfig {
    /// Load config from `~/.config/listen-audit/config.toml`.
    /// Returns default config if file doesn't exist.
    /// Logs a warning if the file exists but can't be parsed.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => match Self::load_from(&path) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("{e}. Using defaults.");
                    Self::default()
                }
            },
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Load an explicit config file. Unlike `load`, failures are errors.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Audit options from config, before CLI overrides.
    pub fn audit_options(&self) -> AuditOptions {
        AuditOptions {
            near_window: Some(self.audit.near_window).filter(|&w| w > 0),
            top_artists: self.audit.top_artists,
        }
    }

    /// Get the config file path.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.audit.near_window, 0);
        assert_eq!(config.audit.top_artists, 20);
        assert!(!config.audit.exclude_podcasts);
        assert_eq!(config.listenbrainz.api_root, "https://api.listenbrainz.org/1");
        assert_eq!(config.listenbrainz.batch_size, 1000);
        assert_eq!(config.listenbrainz.max_retries, 5);
        assert!(config.audit_options().near_window.is_none());
    }

    #[test]
    fn test_partial_config() {
        let config: AppConfig = toml::from_str(
            r#"
            [audit]
            near_window = 60
            exclude_podcasts = true

            [listenbrainz]
            username = "rob"
            rate_limit_ms = 1000
            "#,
        )
        .unwrap();
        assert_eq!(config.audit.near_window, 60);
        assert_eq!(config.audit.top_artists, 20);
        assert!(config.audit.exclude_podcasts);
        assert_eq!(config.listenbrainz.username.as_deref(), Some("rob"));
        assert_eq!(config.listenbrainz.rate_limit_ms, 1000);
        assert_eq!(config.listenbrainz.batch_size, 1000);

        let opts = config.audit_options();
        assert_eq!(opts.near_window, Some(60));
        assert_eq!(opts.top_artists, 20);
    }

    #[test]
    fn test_load_from_reports_parse_error() {
        let path = std::env::temp_dir().join(format!("listen-audit-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[audit]\nnear_window = \"sixty\"\n").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = AppConfig::load_from(Path::new("/nonexistent/listen-audit/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
