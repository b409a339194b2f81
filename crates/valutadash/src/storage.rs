//! Durable storage for the session flag set.
//!
//! The browser original kept the flag set under a single `featureFlags`
//! localStorage key; here the same JSON object lives in one well-known file
//! under the user data directory. The trait keeps the store swappable: the
//! in-memory implementation backs tests, and the null implementation models
//! contexts with no persistence medium at all.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::error::{Error, Result};
use crate::flags::FlagSet;

/// Well-known file name for the persisted flag set.
const PERSIST_FILE_NAME: &str = "featureFlags.json";

/// Default data directory name.
const DATA_DIR_NAME: &str = "valutadash";

/// A durable store for the session flag set.
pub trait FlagPersistence: Send + Sync {
    /// Whether a persistence medium is present at all.
    fn is_available(&self) -> bool {
        true
    }

    /// Read the raw persisted JSON, if any was ever stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium exists but cannot be read.
    fn load(&self) -> Result<Option<String>>;

    /// Persist the full flag set, replacing any previous copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn store(&self, flags: &FlagSet) -> Result<()>;

    /// Remove the persisted copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal fails.
    fn clear(&self) -> Result<()>;

    /// Human-readable description of the medium, for status output.
    fn describe(&self) -> String;
}

/// File-backed flag persistence.
#[derive(Debug, Clone)]
pub struct FileFlagPersistence {
    path: PathBuf,
}

impl FileFlagPersistence {
    /// Create a store at the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a store at the default per-user location.
    #[must_use]
    pub fn at_default_location() -> Self {
        Self::new(Self::default_path())
    }

    /// The default persisted-flags path,
    /// `~/.local/share/valutadash/featureFlags.json`.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
            .join(PERSIST_FILE_NAME)
    }

    /// Path this store reads and writes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FlagPersistence for FileFlagPersistence {
    fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(Error::PersistenceRead {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn store(&self, flags: &FlagSet) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let json = serde_json::to_string_pretty(flags)?;
        fs::write(&self.path, json).map_err(|source| Error::PersistenceWrite {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), "persisted flag set");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(Error::PersistenceWrite {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory flag persistence, for tests.
#[derive(Debug, Default)]
pub struct MemoryFlagPersistence {
    slot: Mutex<Option<String>>,
}

impl MemoryFlagPersistence {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with raw content, valid or not.
    #[must_use]
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(raw.into())),
        }
    }

    /// The raw stored content, if any.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl FlagPersistence for MemoryFlagPersistence {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.raw())
    }

    fn store(&self, flags: &FlagSet) -> Result<()> {
        let json = serde_json::to_string(flags)?;
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(json);
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// No persistence medium: non-interactive and server contexts.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPersistence;

impl FlagPersistence for NullPersistence {
    fn is_available(&self) -> bool {
        false
    }

    fn load(&self) -> Result<Option<String>> {
        Ok(None)
    }

    fn store(&self, _flags: &FlagSet) -> Result<()> {
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        Ok(())
    }

    fn describe(&self) -> String {
        "unavailable".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> FileFlagPersistence {
        let path = std::env::temp_dir().join(format!(
            "valutadash-storage-{}-{name}",
            std::process::id()
        ));
        fs::remove_file(&path).ok();
        FileFlagPersistence::new(path)
    }

    #[test]
    fn test_file_load_missing_is_none() {
        let store = temp_store("missing.json");
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_file_store_then_load_round_trips() {
        let store = temp_store("roundtrip.json");
        let flags = FlagSet::development();

        store.store(&flags).unwrap();
        let raw = store.load().unwrap().unwrap();
        let parsed: std::collections::BTreeMap<String, bool> =
            serde_json::from_str(&raw).unwrap();

        assert_eq!(parsed.len(), 12);
        assert!(parsed.values().all(|&v| v));

        fs::remove_file(store.path()).ok();
    }

    #[test]
    fn test_file_store_creates_parent_directories() {
        let dir = std::env::temp_dir().join(format!(
            "valutadash-storage-nested-{}",
            std::process::id()
        ));
        fs::remove_dir_all(&dir).ok();
        let store = FileFlagPersistence::new(dir.join("deep").join("featureFlags.json"));

        store.store(&FlagSet::baseline()).unwrap();
        assert!(store.path().exists());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_file_clear_is_idempotent() {
        let store = temp_store("clear.json");
        store.store(&FlagSet::baseline()).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_default_path_shape() {
        let path = FileFlagPersistence::default_path();
        let text = path.to_string_lossy();
        assert!(text.contains("valutadash"));
        assert!(text.ends_with("featureFlags.json"));
    }

    #[test]
    fn test_memory_round_trip() {
        let store = MemoryFlagPersistence::new();
        assert!(store.load().unwrap().is_none());

        store.store(&FlagSet::production_baseline()).unwrap();
        let raw = store.load().unwrap().unwrap();
        assert!(raw.contains("enableFirebaseAuth"));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_memory_with_raw_preserves_garbage() {
        let store = MemoryFlagPersistence::with_raw("{not json");
        assert_eq!(store.load().unwrap(), Some("{not json".to_string()));
    }

    #[test]
    fn test_null_persistence_is_unavailable() {
        let store = NullPersistence;
        assert!(!store.is_available());
        assert!(store.load().unwrap().is_none());
        store.store(&FlagSet::development()).unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
        assert_eq!(store.describe(), "unavailable");
    }

    #[test]
    fn test_describe() {
        assert_eq!(MemoryFlagPersistence::new().describe(), "memory");
        let store = temp_store("describe.json");
        assert!(store.describe().contains("valutadash-storage"));
    }
}
