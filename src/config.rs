//! Application configuration for the pagesift host.
//!
//! One TOML file with four sections, each optional:
//!
//! ```toml
//! [corpus]
//! files = ["/data/pages.jsonl"]
//!
//! [weights]
//! path = "/data/weights.toml"
//!
//! [search]
//! oversample_factor = 3
//! retrieval_timeout_ms = 5000
//! default_top_k = 10
//!
//! [[search.fields]]
//! name = "content"
//! boost = 1.0
//!
//! [[search.fields]]
//! name = "file_name"
//! boost = 2.0
//!
//! [server]
//! host = "127.0.0.1"
//! port = 7700
//! ```

use std::path::{Path, PathBuf};

use pagesift_rank::SearchConfig;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::pagesift_dirs;

/// Corpus files to import at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// JSON Lines files of extracted pages, loaded in order.
    pub files: Vec<PathBuf>,
}

/// Where the ranking weights are persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightsConfig {
    /// Weights file. Defaults to `<data_dir>/weights.toml`.
    pub path: Option<PathBuf>,
}

impl WeightsConfig {
    /// The configured path, or the platform default.
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(pagesift_dirs::weights_file)
    }
}

/// HTTP service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind (0 picks a free port).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7700,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Corpus import.
    pub corpus: CorpusConfig,
    /// Weight persistence.
    pub weights: WeightsConfig,
    /// Searched fields, oversampling and retrieval budget.
    pub search: SearchConfig,
    /// HTTP service.
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))
    }

    /// Load configuration from `path`, or the defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `<config_dir>/config.toml`.
    pub fn default_config_path() -> PathBuf {
        pagesift_dirs::config_file()
    }

    /// Check the search section.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Search`] describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        Ok(())
    }
}
