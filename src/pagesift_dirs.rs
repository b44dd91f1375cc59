//! Application directory paths for pagesift.
//!
//! Uses the [`dirs`] crate for platform-appropriate directory resolution.
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | Data (weights) | `~/Library/Application Support/pagesift/` | `~/.local/share/pagesift/` |
//! | Config | `~/Library/Application Support/pagesift/` | `~/.config/pagesift/` |
//!
//! # Environment Overrides
//!
//! - `PAGESIFT_DATA_DIR` overrides [`data_dir`]
//! - `PAGESIFT_CONFIG_DIR` overrides [`config_dir`]

use std::path::PathBuf;

/// Application data root directory.
///
/// Resolves to `dirs::data_dir()/pagesift/` by default.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("PAGESIFT_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("pagesift"))
        .unwrap_or_else(|| std::env::temp_dir().join("pagesift-data"))
}

/// Application config directory.
///
/// Resolves to `dirs::config_dir()/pagesift/` by default.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("PAGESIFT_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("pagesift"))
        .unwrap_or_else(|| std::env::temp_dir().join("pagesift-config"))
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Persisted ranking weights (`data_dir()/weights.toml`).
#[must_use]
pub fn weights_file() -> PathBuf {
    data_dir().join("weights.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_dir_is_nonempty() {
        assert!(!data_dir().as_os_str().is_empty());
    }

    #[test]
    fn config_file_is_toml_in_config_dir() {
        let file = config_file();
        assert_eq!(file.file_name().and_then(|n| n.to_str()), Some("config.toml"));
        assert_eq!(file.parent(), Some(config_dir().as_path()));
    }

    #[test]
    fn weights_file_lives_in_data_dir() {
        let file = weights_file();
        assert_eq!(file.file_name().and_then(|n| n.to_str()), Some("weights.toml"));
        assert_eq!(file.parent(), Some(data_dir().as_path()));
    }
}
