use std::{collections::HashMap, sync::Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

use super::RemoteMirror;

/// Mirror living inside the process. Used by tests and as a stand-in remote for local runs.
#[derive(Default)]
pub struct MemoryMirror {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths = self
            .values
            .lock()
            .map(|values| values.keys().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        paths.sort();
        paths
    }
}

#[async_trait]
impl RemoteMirror for MemoryMirror {
    async fn push(&self, path: &str, value: &Value) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| anyhow!("Memory mirror lock is poisoned"))?;
        if value.is_null() {
            values.remove(path);
        } else {
            values.insert(path.to_owned(), value.clone());
        }
        Ok(())
    }

    async fn pull(&self, path: &str) -> Result<Option<Value>> {
        let values = self
            .values
            .lock()
            .map_err(|_| anyhow!("Memory mirror lock is poisoned"))?;
        Ok(values.get(path).cloned())
    }
}

/// Mirror used when no remote is configured. Pushes go nowhere and pulls never find anything.
pub struct OfflineMirror;

#[async_trait]
impl RemoteMirror for OfflineMirror {
    async fn push(&self, _path: &str, _value: &Value) -> Result<()> {
        Ok(())
    }

    async fn pull(&self, _path: &str) -> Result<Option<Value>> {
        Ok(None)
    }
}
