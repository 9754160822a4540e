use std::{
    collections::HashMap,
    fs::File,
    io::{ErrorKind, Write},
    path::PathBuf,
    sync::Mutex,
};

use anyhow::{anyhow, bail, Context, Result};
use fs4::fs_std::FileExt;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

const LOCK_FILE_NAME: &str = ".store.lock";

/// Interface for abstracting key-value persistence. Reads and writes are synchronous and a single
/// `set` replaces the whole value atomically. There are no transactions across keys.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Reads a JSON value. Malformed data is treated the same as a missing value.
pub fn read_json<T: DeserializeOwned>(store: &dyn LocalStore, key: &str) -> Result<Option<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_str::<T>(&raw) {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            warn!("Found malformed json under {key}, treating it as absent: {e}");
            Ok(None)
        }
    }
}

pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn LocalStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// The main realization of [LocalStore]. Every key is a file inside `store_dir`.
pub struct FileStore {
    store_dir: PathBuf,
}

impl FileStore {
    pub fn new(store_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&store_dir)?;

        Ok(Self { store_dir })
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        if !is_valid_key(key) {
            bail!("Illegal store key {key:?}");
        }
        Ok(self.store_dir.join(key))
    }

    /// Store-wide lock, so that another process never observes a value mid-rename.
    fn open_lock(&self) -> Result<File> {
        let path = self.store_dir.join(LOCK_FILE_NAME);
        File::options()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .with_context(|| format!("Failed to open lock file {path:?}"))
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        let lock = self.open_lock()?;
        FileExt::lock_shared(&lock)?;
        let result = std::fs::read(&path);
        FileExt::unlock(&lock)?;

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("Failed to read {path:?}")),
        };
        match String::from_utf8(bytes) {
            Ok(v) => {
                debug!("Read {key} from {path:?}");
                Ok(Some(v))
            }
            Err(e) => {
                // Same policy as malformed json.
                warn!("Found non utf-8 data under {key} in {path:?}, treating it as absent: {e}");
                Ok(None)
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        let temp_path = self.store_dir.join(format!(".{key}.tmp"));

        // Semi-safe acquire-release for the store
        let lock = self.open_lock()?;
        FileExt::lock_exclusive(&lock)?;
        let result = (|| -> Result<()> {
            let mut file = File::create(&temp_path)
                .with_context(|| format!("Failed to create {temp_path:?}"))?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
            std::fs::rename(&temp_path, &path)
                .with_context(|| format!("Failed to replace {path:?}"))?;
            Ok(())
        })();
        FileExt::unlock(&lock)?;

        debug!("Wrote {key} into {path:?}");
        result
    }
}

/// Store that lives only as long as the process. Never fails.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("Memory store lock is poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("Memory store lock is poisoned"))?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::storage::entities::{MonthData, Task};

    use super::{read_json, write_json, FileStore, LocalStore, MemoryStore};

    #[test]
    fn test_file_store_basic() -> Result<()> {
        let dir = tempdir()?;
        let store = FileStore::new(dir.path().join("store"))?;

        assert_eq!(store.get("appTitle")?, None);

        store.set("appTitle", "Morning routine")?;
        assert_eq!(store.get("appTitle")?.as_deref(), Some("Morning routine"));

        store.set("appTitle", "Evening routine")?;
        assert_eq!(store.get("appTitle")?.as_deref(), Some("Evening routine"));

        Ok(())
    }

    #[test]
    fn test_file_store_survives_reopen() -> Result<()> {
        let dir = tempdir()?;
        {
            let store = FileStore::new(dir.path().to_owned())?;
            store.set("consistency-2026-10", r#"{"2026-10-19":{"completed":["1"]}}"#)?;
        }
        let store = FileStore::new(dir.path().to_owned())?;
        assert_eq!(
            store.get("consistency-2026-10")?.as_deref(),
            Some(r#"{"2026-10-19":{"completed":["1"]}}"#)
        );
        Ok(())
    }

    #[test]
    fn test_file_store_rejects_path_like_keys() -> Result<()> {
        let dir = tempdir()?;
        let store = FileStore::new(dir.path().to_owned())?;

        assert!(store.set("../escape", "x").is_err());
        assert!(store.get("a/b").is_err());
        assert!(store.set("", "x").is_err());
        Ok(())
    }

    #[test]
    fn test_file_store_corrupt_bytes_are_absent() -> Result<()> {
        let dir = tempdir()?;
        let store = FileStore::new(dir.path().to_owned())?;
        std::fs::write(dir.path().join("userTasks"), [0xff, 0xfe, b'[', b']'])?;
        std::fs::write(dir.path().join("appTitle"), [0xc3, 0x28])?;

        assert_eq!(store.get("appTitle")?, None);
        let tasks: Option<Vec<Task>> = read_json(&store, "userTasks")?;
        assert_eq!(tasks, None);

        store.set("userTasks", "[]")?;
        let tasks: Option<Vec<Task>> = read_json(&store, "userTasks")?;
        assert_eq!(tasks, Some(vec![]));
        Ok(())
    }

    #[test]
    fn test_file_store_malformed_json_is_absent() -> Result<()> {
        let dir = tempdir()?;
        let store = FileStore::new(dir.path().to_owned())?;
        std::fs::write(dir.path().join("consistency-2026-10"), "{\"2026-10-19\": ")?;

        let month: Option<MonthData> = read_json(&store, "consistency-2026-10")?;
        assert_eq!(month, None);
        Ok(())
    }

    #[test]
    fn test_malformed_json_is_absent() -> Result<()> {
        let store = MemoryStore::new();
        store.set("userTasks", "[{\"id\": ")?;

        let tasks: Option<Vec<Task>> = read_json(&store, "userTasks")?;
        assert_eq!(tasks, None);

        let written = vec![Task {
            id: "1".into(),
            name: "Read".into(),
        }];
        write_json(&store, "userTasks", &written)?;
        let tasks: Option<Vec<Task>> = read_json(&store, "userTasks")?;
        assert_eq!(tasks, Some(written));
        Ok(())
    }
}
