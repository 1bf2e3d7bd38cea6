//! Persisted unit preference and search history.
//!
//! Both stores sit on a small [`KeyValueStore`] so the backing can be a
//! directory of JSON files or a plain in-memory map.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::{collections::HashMap, fmt::Debug, fs, path::PathBuf, sync::Arc};
use tracing::warn;

use crate::model::UnitSystem;

pub const UNIT_KEY: &str = "weather_unit";
pub const HISTORY_KEY: &str = "weather_history";

/// Maximum number of history entries kept.
pub const HISTORY_LIMIT: usize = 8;

/// String key-value persistence.
pub trait KeyValueStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(contents))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create data directory: {}", self.dir.display())
        })?;
        let path = self.path_for(key);
        fs::write(&path, value).with_context(|| format!("Failed to write {}", path.display()))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }
}

/// Volatile store, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.lock().remove(key);
        Ok(())
    }
}

fn load_json<T: serde::de::DeserializeOwned>(kv: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match kv.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            warn!(key, error = %err, "failed to read persisted value, using default");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, error = %err, "corrupt persisted value, using default");
            None
        }
    }
}

fn save_json<T: serde::Serialize>(kv: &dyn KeyValueStore, key: &str, value: &T) {
    let result = serde_json::to_string(value)
        .context("Failed to serialize value")
        .and_then(|raw| kv.set(key, &raw));
    if let Err(err) = result {
        warn!(key, error = %err, "failed to persist value");
    }
}

/// Persisted unit preference. Defaults to metric.
#[derive(Debug, Clone)]
pub struct UnitStore {
    kv: Arc<dyn KeyValueStore>,
}

impl UnitStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub fn load(&self) -> UnitSystem {
        load_json(self.kv.as_ref(), UNIT_KEY).unwrap_or_default()
    }

    pub fn save(&self, unit: UnitSystem) {
        save_json(self.kv.as_ref(), UNIT_KEY, &unit);
    }
}

/// Most-recent-first list of search labels, unique ignoring case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHistory {
    entries: Vec<String>,
}

impl SearchHistory {
    /// Build from raw entries, re-applying the dedup and size rules.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let raw: Vec<String> = entries.into_iter().map(|s| s.as_ref().to_string()).collect();
        let mut history = Self::default();
        // Oldest first so the original head ends up at the front again.
        for entry in raw.iter().rev() {
            history.record(entry);
        }
        history
    }

    /// Put `label` at the front, dropping any case-insensitive duplicate and
    /// evicting the oldest entry past the limit. Returns false for blank labels.
    pub fn record(&mut self, label: &str) -> bool {
        let normalized = label.trim();
        if normalized.is_empty() {
            return false;
        }
        let lowered = normalized.to_lowercase();
        self.entries.retain(|e| e.to_lowercase() != lowered);
        self.entries.insert(0, normalized.to_string());
        self.entries.truncate(HISTORY_LIMIT);
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn most_recent(&self) -> Option<&str> {
        self.entries.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Persisted search history. Defaults to empty.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    kv: Arc<dyn KeyValueStore>,
}

impl HistoryStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub fn load(&self) -> SearchHistory {
        load_json::<Vec<String>>(self.kv.as_ref(), HISTORY_KEY)
            .map(SearchHistory::from_entries)
            .unwrap_or_default()
    }

    pub fn save(&self, history: &SearchHistory) {
        save_json(self.kv.as_ref(), HISTORY_KEY, &history.entries);
    }

    /// Drop the persisted list entirely.
    pub fn clear(&self) {
        if let Err(err) = self.kv.remove(HISTORY_KEY) {
            warn!(error = %err, "failed to remove persisted history");
        }
    }
}
