//! Process-wide weight configuration with snapshot reads and serialised
//! atomic updates.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::config::WeightConfig;
use crate::error::ConfigError;

use super::persist::{read_weights, write_weights_atomic};

/// Holds the authoritative [`WeightConfig`].
///
/// Readers take an `Arc` snapshot and never see a half-updated value: an
/// update builds a whole new config, persists it, then swaps the pointer.
/// The read lock is only held for the pointer clone and the write lock only
/// for the pointer swap, so file I/O never blocks readers. Updates serialise
/// on a separate mutex.
#[derive(Debug)]
pub struct WeightStore {
    path: Option<PathBuf>,
    current: RwLock<Arc<WeightConfig>>,
    update_lock: Mutex<()>,
}

impl WeightStore {
    /// Open a store backed by `path`, loading persisted weights or the
    /// defaults if the file does not exist yet.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the file exists but is unreadable,
    /// malformed or out of range.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let initial = read_weights(&path)?.unwrap_or_default();
        tracing::debug!(path = %path.display(), ?initial, "weight store opened");
        Ok(Self {
            path: Some(path),
            current: RwLock::new(Arc::new(initial)),
            update_lock: Mutex::new(()),
        })
    }

    /// A store that keeps weights in memory only.
    pub fn in_memory(initial: WeightConfig) -> Self {
        Self {
            path: None,
            current: RwLock::new(Arc::new(initial)),
            update_lock: Mutex::new(()),
        }
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Current snapshot used for scoring.
    pub fn current(&self) -> Arc<WeightConfig> {
        // The guarded value is an `Arc` that is only ever replaced whole, so a
        // poisoned lock still holds a consistent snapshot.
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Return the persisted weights, or the defaults if none were ever saved.
    ///
    /// A memory-only store returns its current snapshot.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the backing file is unreadable or invalid.
    pub fn load(&self) -> Result<WeightConfig, ConfigError> {
        match &self.path {
            Some(path) => Ok(read_weights(path)?.unwrap_or_default()),
            None => Ok(*self.current()),
        }
    }

    /// Validate, persist and publish a complete replacement config.
    ///
    /// Nothing changes when validation or persistence fails; the previous
    /// config stays authoritative.
    ///
    /// # Errors
    /// Returns [`ConfigError::Validation`] for out-of-range weights, a write
    /// error if the file could not be replaced, or
    /// [`ConfigError::LockPoisoned`] if a previous updater panicked.
    pub fn update(&self, candidate: WeightConfig) -> Result<(), ConfigError> {
        candidate.validate()?;

        let _serialised = self
            .update_lock
            .lock()
            .map_err(|_| ConfigError::LockPoisoned)?;

        if let Some(path) = &self.path {
            write_weights_atomic(path, &candidate)?;
        }

        let mut current = self
            .current
            .write()
            .map_err(|_| ConfigError::LockPoisoned)?;
        *current = Arc::new(candidate);
        drop(current);

        tracing::info!(
            proximity = candidate.proximity_weight,
            position = candidate.position_weight,
            idf = candidate.idf_weight,
            "ranking weights updated"
        );
        Ok(())
    }
}

impl Default for WeightStore {
    fn default() -> Self {
        Self::in_memory(WeightConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn make_test_dir() -> tempfile::TempDir {
        match tempfile::tempdir() {
            Ok(d) => d,
            Err(_) => unreachable!("tempdir creation should not fail"),
        }
    }

    #[test]
    fn open_without_file_uses_defaults() {
        let dir = make_test_dir();
        let store = WeightStore::open(dir.path().join("weights.toml")).expect("open");
        assert_eq!(*store.current(), WeightConfig::default());
        assert_eq!(store.load().expect("load"), WeightConfig::default());
    }

    #[test]
    fn update_then_load_round_trips() {
        let dir = make_test_dir();
        let store = WeightStore::open(dir.path().join("weights.toml")).expect("open");
        let w = WeightConfig::new(0.3, 0.7, 2.9).expect("valid");

        store.update(w).expect("update");

        assert!(store.load().expect("load").approx_eq(&w, 1e-9));
        assert_eq!(*store.current(), w);
    }

    #[test]
    fn reopen_sees_persisted_weights() {
        let dir = make_test_dir();
        let path = dir.path().join("weights.toml");
        let w = WeightConfig::new(4.0, 0.0, 0.5).expect("valid");
        WeightStore::open(&path).expect("open").update(w).expect("update");

        let reopened = WeightStore::open(&path).expect("reopen");
        assert_eq!(*reopened.current(), w);
    }

    #[test]
    fn rejected_update_keeps_previous_config() {
        let dir = make_test_dir();
        let store = WeightStore::open(dir.path().join("weights.toml")).expect("open");
        let first = WeightConfig::new(1.0, 1.0, 1.0).expect("valid");
        store.update(first).expect("update");

        let bad = WeightConfig {
            proximity_weight: -1.0,
            ..first
        };
        let err = store.update(bad).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));

        assert_eq!(store.load().expect("load"), first);
        assert_eq!(*store.current(), first);
    }

    #[test]
    fn snapshot_outlives_update() {
        let store = WeightStore::default();
        let before = store.current();
        store
            .update(WeightConfig::new(9.0, 9.0, 9.0).expect("valid"))
            .expect("update");
        assert_eq!(*before, WeightConfig::default());
        assert!((store.current().idf_weight - 9.0).abs() < f64::EPSILON);
    }

    #[test]
    fn in_memory_load_returns_current() {
        let w = WeightConfig::new(0.1, 0.2, 0.3).expect("valid");
        let store = WeightStore::in_memory(w);
        assert!(store.path().is_none());
        assert_eq!(store.load().expect("load"), w);
    }

    #[test]
    fn concurrent_readers_never_see_mixed_configs() {
        let store = Arc::new(WeightStore::default());
        let configs: Vec<WeightConfig> = (1..=20)
            .map(|i| {
                let v = f64::from(i);
                WeightConfig::new(v, v, v).expect("valid")
            })
            .collect();

        let writer = {
            let store = Arc::clone(&store);
            let configs = configs.clone();
            thread::spawn(move || {
                for c in configs {
                    store.update(c).expect("update");
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..500 {
                        let w = store.current();
                        let default = WeightConfig::default();
                        let uniform = (w.proximity_weight - w.position_weight).abs() < f64::EPSILON
                            && (w.position_weight - w.idf_weight).abs() < f64::EPSILON;
                        assert!(uniform || *w == default, "torn config observed: {w:?}");
                    }
                })
            })
            .collect();

        writer.join().expect("writer thread");
        for r in readers {
            r.join().expect("reader thread");
        }
        assert!((store.current().idf_weight - 20.0).abs() < f64::EPSILON);
    }
}
