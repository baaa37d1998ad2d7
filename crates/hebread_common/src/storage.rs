//! Persistent store with namespacing and safety.
//!
//! A `Store` wraps a raw key/value medium and prefixes every key with the
//! application namespace, so `reset_all` only sweeps our own keys.
//! Load/save never fail to the caller: medium errors and undecodable
//! payloads are logged and surface as a fallback value or `false`.

use crate::error::{HebreadError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Default namespace prefix for persisted keys
pub const DEFAULT_NAMESPACE: &str = "hebrew-read";

/// File name used by `FileMedium` inside the data directory
pub const STORAGE_FILE: &str = "storage.json";

// ============================================================================
// Raw medium
// ============================================================================

/// Durable string key/value medium (the local-storage analogue)
pub trait KvMedium: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;
}

impl<M: KvMedium + ?Sized> KvMedium for Arc<M> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }
}

/// In-process medium. Used for the session channel and in tests.
#[derive(Debug, Default)]
pub struct MemoryMedium {
    entries: Mutex<BTreeMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set` fail as if the quota were exhausted
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Write a raw value, bypassing namespacing (tests use this to plant corrupt data)
    pub fn insert_raw(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| HebreadError::Storage("memory medium poisoned".to_string()))
    }
}

impl KvMedium for MemoryMedium {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(HebreadError::QuotaExceeded(key.to_string()));
        }
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

/// Single JSON object file mapping raw keys to string values
#[derive(Debug)]
pub struct FileMedium {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    guard: Mutex<()>,
}

impl FileMedium {
    /// Open (lazily) the medium file inside `data_dir`
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(STORAGE_FILE),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let data = fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        match serde_json::from_str(&data) {
            Ok(map) => Ok(map),
            Err(e) => {
                self.quarantine(&e);
                Ok(BTreeMap::new())
            }
        }
    }

    /// Move an undecodable file aside so the next write starts clean
    fn quarantine(&self, error: &serde_json::Error) {
        let aside = self.path.with_extension("json.corrupt");
        match fs::rename(&self.path, &aside) {
            Ok(()) => warn!(
                path = %self.path.display(),
                moved_to = %aside.display(),
                error = %error,
                "[storage] medium file undecodable, moved aside"
            ),
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "[storage] medium file undecodable and could not be moved aside"
            ),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(map)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn with_map<T>(&self, f: impl FnOnce(&mut BTreeMap<String, String>) -> T) -> Result<T> {
        let _held = self
            .guard
            .lock()
            .map_err(|_| HebreadError::Storage("file medium poisoned".to_string()))?;
        let mut map = self.read_map()?;
        let out = f(&mut map);
        self.write_map(&map)?;
        Ok(out)
    }
}

impl KvMedium for FileMedium {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.with_map(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.with_map(|map| {
            map.remove(key);
        })
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.read_map()?.into_keys().collect())
    }
}

// ============================================================================
// Namespaced store
// ============================================================================

/// Namespaced load/save/reset over a `KvMedium`
pub struct Store<M: KvMedium> {
    medium: M,
    namespace: String,
}

impl<M: KvMedium> Store<M> {
    pub fn new(medium: M, namespace: &str) -> Self {
        Self {
            medium,
            namespace: namespace.to_string(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn medium(&self) -> &M {
        &self.medium
    }

    fn ns_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    fn prefix(&self) -> String {
        format!("{}:", self.namespace)
    }

    fn load_raw(&self, key: &str) -> Option<String> {
        match self.medium.get(&self.ns_key(key)) {
            Ok(Some(raw)) if !raw.is_empty() => Some(raw),
            Ok(_) => None,
            Err(e) => {
                warn!(key, kind = e.kind(), "[storage] load failed: {}", e);
                None
            }
        }
    }

    /// Load and decode `key`; missing or undecodable data yields `None`
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.load_raw(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, "[storage] load failed: undecodable payload: {}", e);
                None
            }
        }
    }

    /// Load `key`, or return `fallback` when it is missing or corrupt
    pub fn load_or<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        self.load(key).unwrap_or(fallback)
    }

    /// Load `key` as an untyped JSON value (used for shallow merges)
    pub fn load_value(&self, key: &str) -> Option<serde_json::Value> {
        self.load(key)
    }

    /// Encode and write `value`; returns false on any failure
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let encoded = match serde_json::to_string(value) {
            Ok(s) => s,
            Err(e) => {
                warn!(key, "[storage] save failed: encode: {}", e);
                return false;
            }
        };
        match self.medium.set(&self.ns_key(key), &encoded) {
            Ok(()) => {
                debug!(key, bytes = encoded.len(), "[storage] saved");
                true
            }
            Err(e) => {
                warn!(key, kind = e.kind(), "[storage] save failed: {}", e);
                false
            }
        }
    }

    pub fn remove(&self, key: &str) {
        if let Err(e) = self.medium.remove(&self.ns_key(key)) {
            debug!(key, "[storage] remove failed: {}", e);
        }
    }

    /// Remove every key under this namespace; returns how many were removed
    pub fn reset_all(&self) -> usize {
        let prefix = self.prefix();
        let keys = match self.medium.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!("[storage] resetAll failed: {}", e);
                return 0;
            }
        };
        let mut removed = 0;
        for key in keys.into_iter().filter(|k| k.starts_with(&prefix)) {
            match self.medium.remove(&key) {
                Ok(()) => removed += 1,
                Err(e) => warn!(key, "[storage] resetAll could not remove key: {}", e),
            }
        }
        removed
    }
}
