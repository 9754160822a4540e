//! Best-effort replication of the local store to a remote tree store.
//!
//! Writes are push-only (local to remote), reads of tasks and title are pull-merge (remote to
//! local, remote wins when it has a value). Nothing here is ever surfaced to the user: a failed
//! or slow remote call simply never applies its effect. There are no version stamps, the write
//! applied last wins.

pub mod memory;
pub mod queue;
pub mod rest;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Contract every remote backend implements. Paths are `/`-separated, e.g.
/// `users/user_1_2/daily/2026-10-19`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteMirror: Send + Sync + 'static {
    /// Replaces the value at `path`.
    async fn push(&self, path: &str, value: &Value) -> Result<()>;

    /// Reads the value at `path`. `None` means the remote has nothing there.
    async fn pull(&self, path: &str) -> Result<Option<Value>>;
}

/// Builds remote paths for a single installation, all rooted at `users/{user_id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePaths {
    root: String,
}

impl RemotePaths {
    pub fn new(user_id: &str) -> Self {
        Self {
            root: format!("users/{user_id}"),
        }
    }

    pub fn tasks(&self) -> String {
        format!("{}/tasks", self.root)
    }

    pub fn title(&self) -> String {
        format!("{}/appTitle", self.root)
    }

    pub fn daily(&self, day_key: &str) -> String {
        format!("{}/daily/{day_key}", self.root)
    }
}
