use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusty_safe_multisig_core::{KeyValueStore, PortError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn keys(&self) -> Result<Vec<String>, PortError> {
        Ok(self.lock()?.keys().cloned().collect())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, PortError> {
        self.entries
            .lock()
            .map_err(|e| PortError::Transport(format!("store lock poisoned: {e}")))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PortError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PortError> {
        self.lock()?.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), PortError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// One JSON object on disk, rewritten through a temp file on every change.
///
/// A missing file is an empty store. An unreadable one is an error so a bad
/// path never silently discards queued signatures.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PortError> {
        let path = path.into();
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)
                .map_err(|e| PortError::Transport(format!("read {}: {e}", path.display())))?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw).map_err(|e| {
                    PortError::Validation(format!("{} is not a store file: {e}", path.display()))
                })?
            }
        } else {
            BTreeMap::new()
        };
        tracing::debug!(path = %path.display(), keys = entries.len(), "opened json store");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update<F>(&self, f: F) -> Result<(), PortError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| PortError::Transport(format!("store lock poisoned: {e}")))?;
        let mut next = entries.clone();
        f(&mut next);
        persist(&self.path, &next)?;
        *entries = next;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PortError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| PortError::Transport(format!("store lock poisoned: {e}")))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PortError> {
        self.update(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
        })
    }

    fn delete(&self, key: &str) -> Result<(), PortError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

fn persist(path: &Path, entries: &BTreeMap<String, String>) -> Result<(), PortError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| PortError::Transport(format!("create {}: {e}", parent.display())))?;
    }
    let raw = serde_json::to_string_pretty(entries)
        .map_err(|e| PortError::Transport(format!("serialize store: {e}")))?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, raw)
        .map_err(|e| PortError::Transport(format!("write {}: {e}", tmp.display())))?;
    fs::rename(&tmp, path)
        .map_err(|e| PortError::Transport(format!("replace {}: {e}", path.display())))
}
