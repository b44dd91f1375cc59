//! Atomic weights file operations.
//!
//! The weights file is a three-field TOML record. Writes go temp file →
//! fsync → rename → directory fsync, so a reader sees either the old or the
//! new record and a returned update survives a crash.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::WeightConfig;
use crate::error::ConfigError;

/// Read persisted weights.
///
/// Returns `Ok(None)` when the file does not exist.
///
/// # Errors
/// Returns [`ConfigError::Read`] if the file exists but cannot be read,
/// [`ConfigError::Parse`] if it is not a valid weights record, and
/// [`ConfigError::Validation`] if it holds out-of-range values.
pub fn read_weights(path: &Path) -> Result<Option<WeightConfig>, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let weights: WeightConfig = toml::from_str(&text).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    weights.validate()?;
    Ok(Some(weights))
}

/// Write weights atomically and durably.
///
/// # Errors
/// Returns [`ConfigError::Serialize`] or [`ConfigError::Write`] on failure.
/// On failure the previous file, if any, is left untouched.
pub fn write_weights_atomic(path: &Path, weights: &WeightConfig) -> Result<(), ConfigError> {
    let text =
        toml::to_string_pretty(weights).map_err(|e| ConfigError::Serialize(e.to_string()))?;
    let tmp_path = temp_path(path);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let write_tmp = || -> std::io::Result<()> {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(text.as_bytes())?;
        file.sync_all()
    };
    if let Err(source) = write_tmp() {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(ConfigError::Write {
            path: tmp_path,
            source,
        });
    }

    if let Err(source) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(ConfigError::Write {
            path: path.to_path_buf(),
            source,
        });
    }

    sync_parent_dir(path)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "weights.toml".into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Persist the rename itself. Directories cannot be opened for sync on
/// Windows, so this is a no-op there.
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> Result<(), ConfigError> {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    std::fs::File::open(parent)
        .and_then(|dir| dir.sync_all())
        .map_err(|source| ConfigError::Write {
            path: parent.to_path_buf(),
            source,
        })
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}
