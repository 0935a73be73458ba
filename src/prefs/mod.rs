//! File-backed key/value preferences.
//!
//! The whole map is one JSON object on disk. Writes go temp file → fsync →
//! rename, so a concurrent reader sees either the old or the new file.

pub mod ledger;

pub use ledger::ReminderLedger;

use crate::error::AppError;
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct Preferences {
    path: PathBuf,
}

impl Preferences {
    pub fn open(path: &Path) -> Self {
        Self { path: path.to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored map; a missing file is an empty map.
    pub fn read(&self) -> Result<Map<String, Value>, AppError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(AppError::Io(e)),
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(AppError::Parse(format!(
                "preferences file '{}' is not a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(AppError::Parse(format!(
                "failed to parse preferences file '{}': {e}",
                self.path.display()
            ))),
        }
    }

    /// Like [`Preferences::read`], but an unreadable file counts as empty.
    fn read_or_empty(&self) -> Map<String, Value> {
        self.read().unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable preferences: {e}");
            Map::new()
        })
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.read_or_empty().remove(key)
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.read_or_empty().remove(key) {
            Some(Value::String(s)) => Some(s),
            Some(_) | None => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.read_or_empty().get(key).and_then(Value::as_bool)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read_or_empty().contains_key(key)
    }

    /// Apply `edit` to the stored map and write the result back atomically.
    pub fn update<F>(&self, edit: F) -> Result<(), AppError>
    where
        F: FnOnce(&mut Map<String, Value>),
    {
        let mut map = self.read_or_empty();
        edit(&mut map);
        self.write_atomic(&Value::Object(map))
    }

    pub fn put_string(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.update(|map| {
            map.insert(key.to_string(), Value::String(value.to_string()));
        })
    }

    pub fn put_bool(&self, key: &str, value: bool) -> Result<(), AppError> {
        self.update(|map| {
            map.insert(key.to_string(), Value::Bool(value));
        })
    }

    fn write_atomic(&self, value: &Value) -> Result<(), AppError> {
        let text = serde_json::to_string_pretty(value)
            .map_err(|e| AppError::Internal(format!("failed to serialize preferences: {e}")))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(text.as_bytes())?;
        file.sync_all()?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}
