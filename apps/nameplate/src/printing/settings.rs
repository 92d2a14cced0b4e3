//! Settings store — a small JSON-file key-value map shared by the HTTP glue.
//!
//! The layout engine never reads it. The only key in use today is the selected
//! printer. A missing or unreadable file starts an empty store; writes replace the
//! file atomically.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

pub const PRINTER_KEY: &str = "printer";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Settings persist error: {0}")]
    Persist(#[from] tempfile::PersistError),
}

#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, Value>>,
}

impl SettingsStore {
    /// Opens the store at `path`. Never fails: a missing file is an empty store and a
    /// corrupt one is logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, Value>>(&raw) {
                Ok(values) => {
                    info!(path = %path.display(), keys = values.len(), "Loaded settings");
                    values
                }
                Err(e) => {
                    warn!(path = %path.display(), "Ignoring unreadable settings file: {e}");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), "Error loading settings: {e}");
                BTreeMap::new()
            }
        };
        Self {
            path,
            values: RwLock::new(values),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.read().get(key).cloned()
    }

    pub fn get_str(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| v.as_str().map(str::to_string))
    }

    /// Sets `key` and persists the whole map.
    pub fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        let mut values = self.write();
        values.insert(key.to_string(), value);
        self.persist(&values)
    }

    /// Removes `key` and persists the whole map.
    pub fn remove(&self, key: &str) -> Result<(), SettingsError> {
        let mut values = self.write();
        if values.remove(key).is_some() {
            self.persist(&values)?;
        }
        Ok(())
    }

    pub fn printer(&self) -> Option<String> {
        self.get_str(PRINTER_KEY)
    }

    pub fn set_printer(&self, printer: Option<&str>) -> Result<(), SettingsError> {
        match printer {
            Some(name) => self.set(PRINTER_KEY, Value::String(name.to_string()))?,
            None => self.remove(PRINTER_KEY)?,
        }
        info!(printer = ?printer, "Saved printer selection");
        Ok(())
    }

    fn persist(&self, values: &BTreeMap<String, Value>) -> Result<(), SettingsError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, values)?;
        tmp.write_all(b"\n")?;
        tmp.persist(&self.path)?;
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, Value>> {
        self.values.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, Value>> {
        self.values.write().unwrap_or_else(|e| e.into_inner())
    }
}
