//! Persistence seam and its implementations.
//!
//! The manager only needs "save blob under key" and "load blob by key".
//! [`SqliteStore`] keeps blobs in a SQLite key-value table on disk;
//! [`MemoryStore`] keeps them in a map for tests and ephemeral sessions.

mod config;
pub mod database;

pub use config::{AlarmConfig, Config, SimulationConfig};
pub use database::SqliteStore;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::{Result, StorageError};

/// Blob storage keyed by string.
pub trait Store {
    fn save(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// `Ok(None)` when nothing is stored under `key`.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>>;
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn save(&self, key: &str, bytes: &[u8]) -> Result<()> {
        (**self).save(key, bytes)
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).load(key)
    }
}

/// In-memory [`Store`]. Clones share the same map, so a test can keep a
/// handle and inspect what the manager wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .blobs
            .lock()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

impl Store for MemoryStore {
    fn save(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| StorageError::Locked)?;
        blobs.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| StorageError::Locked)?;
        Ok(blobs.get(key).cloned())
    }
}

/// Returns `~/.config/puzzalarm[-dev]/` based on PUZZALARM_ENV.
///
/// Set PUZZALARM_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("PUZZALARM_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("puzzalarm-dev")
    } else {
        base_dir.join("puzzalarm")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.load("missing").unwrap().is_none());
        store.save("k", b"hello").unwrap();
        assert_eq!(store.load("k").unwrap().as_deref(), Some(&b"hello"[..]));
        store.save("k", b"bye").unwrap();
        assert_eq!(store.load("k").unwrap().as_deref(), Some(&b"bye"[..]));
    }

    #[test]
    fn memory_store_clones_share_data() {
        let store = MemoryStore::new();
        let handle = store.clone();
        store.save("a", b"1").unwrap();
        assert_eq!(handle.keys(), vec!["a".to_string()]);
    }

    #[test]
    fn boxed_store_delegates() {
        let store: Box<dyn Store> = Box::new(MemoryStore::new());
        store.save("x", b"y").unwrap();
        assert!(store.load("x").unwrap().is_some());
    }
}
