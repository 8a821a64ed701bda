//! Runtime configuration of the `airsense-node` host binary.
//!
//! This is not the device settings (those live in `/config.json` on the
//! flash filesystem).  It tells the host binary where the flash directory is
//! and how verbose to log, and is read from a TOML file, `airsense.toml` by
//! default:
//!
//! ```toml
//! flash_dir = "/var/lib/airsense/flash"
//! log_level = "debug"
//! ```
//!
//! Every field has a default, so a missing file or a file that only sets
//! some fields is fine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default file name looked up in the working directory.
pub const DEFAULT_NODE_CONFIG_FILE: &str = "airsense.toml";

/// Error type for reading the runtime configuration.
#[derive(Debug, Error)]
pub enum NodeConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Runtime settings of the host binary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeConfig {
    /// Directory that stands in for the flash filesystem.
    #[serde(default = "default_flash_dir")]
    pub flash_dir: PathBuf,
    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_flash_dir() -> PathBuf {
    PathBuf::from("flash")
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            flash_dir: default_flash_dir(),
            log_level: default_log_level(),
        }
    }
}

/// Loads the runtime configuration from `path`, returning
/// `NodeConfig::default()` if the file does not exist.
///
/// # Errors
///
/// Returns [`NodeConfigError::Io`] for file-system errors other than "not
/// found", and [`NodeConfigError::Parse`] if the TOML is malformed.
pub fn load_node_config(path: &Path) -> Result<NodeConfig, NodeConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(NodeConfig::default()),
        Err(source) => Err(NodeConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_default_config() {
        let cfg = NodeConfig::default();
        assert_eq!(cfg.flash_dir, PathBuf::from("flash"));
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_deserialize_empty_toml_uses_defaults() {
        let cfg: NodeConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, NodeConfig::default());
    }

    #[test]
    fn test_deserialize_partial_toml_overrides_defaults() {
        // Arrange
        let toml_str = r#"log_level = "debug""#;

        // Act
        let cfg: NodeConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.flash_dir, PathBuf::from("flash"));
    }

    #[test]
    fn test_load_returns_default_when_file_absent() {
        let path = PathBuf::from("/nonexistent/path/that/cannot/exist/airsense.toml");
        assert_eq!(load_node_config(&path).unwrap(), NodeConfig::default());
    }

    #[test]
    fn test_load_reads_file_from_temp_dir() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("airsense_test_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(DEFAULT_NODE_CONFIG_FILE);
        std::fs::write(&path, "flash_dir = \"/data/flash\"\n").unwrap();

        // Act
        let cfg = load_node_config(&path).unwrap();

        // Assert
        assert_eq!(cfg.flash_dir, PathBuf::from("/data/flash"));
        assert_eq!(cfg.log_level, "info");

        // Cleanup
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_rejects_invalid_toml() {
        let dir = std::env::temp_dir().join(format!("airsense_test_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(DEFAULT_NODE_CONFIG_FILE);
        std::fs::write(&path, "[[[ not valid toml").unwrap();

        let result = load_node_config(&path);

        assert!(matches!(result, Err(NodeConfigError::Parse(_))));
        std::fs::remove_dir_all(&dir).ok();
    }
}
