//! Dashboard configuration
//!
//! The data-source mode is fixed at configuration time; there is no
//! runtime transition between local and remote sourcing.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse YAML
    #[error("failed to parse YAML in {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Where entity state comes from
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DataSource {
    /// Static fixture snapshot held in memory
    #[default]
    Local,
    /// Live push-based connection to a remote server
    Remote { url: String, token: String },
}

/// Top-level dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Data-source mode
    pub source: DataSource,

    /// Entity-id prefixes admitted into the directory
    pub allowed_prefixes: Vec<String>,

    /// Exact entity ids excluded from the directory
    pub blocked_entities: Vec<String>,

    /// Directory holding the `.storage/` cache files
    pub config_dir: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source: DataSource::Local,
            allowed_prefixes: ["light.", "fan.", "switch.", "climate."]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            blocked_entities: Vec::new(),
            config_dir: PathBuf::from("."),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!("Loading dashboard config: {:?}", path);

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseYaml {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.source, DataSource::Local);
        assert!(config.allowed_prefixes.contains(&"light.".to_string()));
        assert!(config.blocked_entities.is_empty());
    }

    #[test]
    fn test_parse_remote_source() {
        let config: DashboardConfig = serde_yaml::from_str(
            r#"
source:
  mode: remote
  url: http://hass.local:8123
  token: abc123
allowed_prefixes:
  - "light."
blocked_entities:
  - light.hidden
"#,
        )
        .unwrap();

        assert_eq!(
            config.source,
            DataSource::Remote {
                url: "http://hass.local:8123".into(),
                token: "abc123".into(),
            }
        );
        assert_eq!(config.allowed_prefixes, vec!["light.".to_string()]);
        assert_eq!(config.blocked_entities, vec!["light.hidden".to_string()]);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: DashboardConfig = serde_yaml::from_str("source:\n  mode: local\n").unwrap();
        assert_eq!(config.source, DataSource::Local);
        assert_eq!(config.allowed_prefixes.len(), 4);
    }
}
