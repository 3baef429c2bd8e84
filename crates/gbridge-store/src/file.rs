//! Durable TOML-backed store

use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde_json::Value;

use gbridge_core::prelude::*;

use crate::store::StateStore;

/// Durable store backend: one TOML document on disk.
///
/// Every `set` is a read-modify-write of the whole document under an
/// exclusive file lock, so per-key updates are atomic with respect to other
/// writers in this or any other process. Readers take a shared lock.
///
/// A malformed document degrades to an empty one on read; it is rewritten
/// wholesale on the next `set`. Readers never see an error for someone
/// else's bad write.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) the store backed by `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|_| Error::store_open(&path))?;
        }
        std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|_| Error::store_open(&path))?;

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the whole document, degrading to empty on any failure
    fn read_document(&self) -> toml::Table {
        let file = match std::fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) => {
                warn!("cannot open store file {:?}: {e}", self.path);
                return toml::Table::new();
            }
        };

        if let Err(e) = file.lock_shared() {
            warn!("cannot lock store file {:?}: {e}", self.path);
            return toml::Table::new();
        }

        let mut content = String::new();
        let mut file = file;
        if let Err(e) = file.read_to_string(&mut content) {
            warn!("cannot read store file {:?}: {e}", self.path);
            return toml::Table::new();
        }

        match content.parse::<toml::Table>() {
            Ok(table) => table,
            Err(e) => {
                warn!("malformed store document {:?}: {e}", self.path);
                toml::Table::new()
            }
        }
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.read_document().get(key).map(toml_to_json)
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let toml_value = json_to_toml(&value)?;

        // Exclusive lock for the whole read-modify-write cycle
        let mut file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| Error::store(format!("failed to open {:?}: {e}", self.path)))?;

        file.lock_exclusive()
            .map_err(|e| Error::store(format!("failed to lock {:?}: {e}", self.path)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::store(format!("failed to read {:?}: {e}", self.path)))?;

        let mut table = content.parse::<toml::Table>().unwrap_or_else(|e| {
            warn!("malformed store document {:?}, rewriting: {e}", self.path);
            toml::Table::new()
        });
        table.insert(key.to_string(), toml_value);

        let serialized = toml::to_string(&table)
            .map_err(|e| Error::store(format!("failed to serialize store document: {e}")))?;

        file.set_len(0)
            .map_err(|e| Error::store(format!("failed to truncate {:?}: {e}", self.path)))?;
        file.seek(SeekFrom::Start(0))
            .map_err(|e| Error::store(format!("failed to rewind {:?}: {e}", self.path)))?;
        file.write_all(serialized.as_bytes())
            .map_err(|e| Error::store(format!("failed to write {:?}: {e}", self.path)))?;
        file.flush()
            .map_err(|e| Error::store(format!("failed to flush {:?}: {e}", self.path)))?;

        // Lock is released when file is dropped
        Ok(())
    }
}

/// Convert a JSON value to its TOML form.
///
/// TOML has no null, so null values are rejected rather than silently
/// dropped.
fn json_to_toml(value: &Value) -> Result<toml::Value> {
    match value {
        Value::Null => Err(Error::store("cannot store null value")),
        Value::Bool(b) => Ok(toml::Value::Boolean(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(toml::Value::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(toml::Value::Float(f))
            } else {
                Err(Error::store(format!("number out of range: {n}")))
            }
        }
        Value::String(s) => Ok(toml::Value::String(s.clone())),
        Value::Array(items) => items
            .iter()
            .map(json_to_toml)
            .collect::<Result<Vec<_>>>()
            .map(toml::Value::Array),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| Ok((k.clone(), json_to_toml(v)?)))
            .collect::<Result<toml::map::Map<_, _>>>()
            .map(toml::Value::Table),
    }
}

fn toml_to_json(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::from(*i),
        toml::Value::Float(f) => Value::from(*f),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_json(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("state.toml")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("state.toml");
        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.path(), path);
        assert!(path.exists());
    }

    #[test]
    fn test_set_then_get_round_trip() {
        let (_dir, store) = temp_store();
        store.set("bridge.user_name", json!("Asha")).unwrap();
        store.set("bridge.guardian_count", json!(3)).unwrap();

        assert_eq!(store.get("bridge.user_name"), Some(json!("Asha")));
        assert_eq!(store.get("bridge.guardian_count"), Some(json!(3)));
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.toml");

        {
            let store = FileStore::open(&path).unwrap();
            store.set("bridge.safety_status", json!("Alert")).unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("bridge.safety_status"), Some(json!("Alert")));
    }

    #[test]
    fn test_last_write_wins() {
        let (_dir, store) = temp_store();
        store.set("bridge.safety_status", json!("Safe")).unwrap();
        store.set("bridge.safety_status", json!("Alert")).unwrap();
        assert_eq!(store.get("bridge.safety_status"), Some(json!("Alert")));
    }

    #[test]
    fn test_malformed_document_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.toml");
        std::fs::write(&path, "this is { not toml").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("bridge.user_name"), None);

        // A write rewrites the document wholesale
        store.set("bridge.user_name", json!("Asha")).unwrap();
        assert_eq!(store.get("bridge.user_name"), Some(json!("Asha")));
    }

    #[test]
    fn test_null_value_rejected() {
        let (_dir, store) = temp_store();
        let err = store.set("key", Value::Null).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_compound_values_round_trip() {
        let (_dir, store) = temp_store();
        store
            .set("guardians", json!(["Asha", "Meera", "Zoya"]))
            .unwrap();
        assert_eq!(
            store.get("guardians"),
            Some(json!(["Asha", "Meera", "Zoya"]))
        );
    }

    #[test]
    fn test_concurrent_writers_to_different_keys() {
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileStore::open(dir.path().join("state.toml")).unwrap());

        let mut handles = Vec::new();
        for i in 0..4 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                store.set(&format!("key{i}"), json!(i)).unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        for i in 0..4 {
            assert_eq!(store.get(&format!("key{i}")), Some(json!(i)));
        }
    }
}
