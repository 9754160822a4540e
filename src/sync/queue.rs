use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tokio::{
    select,
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    storage::{
        entities::Task,
        local_store::{write_json, LocalStore},
        TASKS_KEY, TITLE_KEY,
    },
    tracker::notify::{Notifier, Refresh},
};

use super::RemoteMirror;

/// Local entity a pulled value gets written back into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullTarget {
    Tasks,
    Title,
}

#[derive(Debug)]
enum SyncCommand {
    Push { path: String, value: Value },
    Pull { path: String, target: PullTarget },
    Flush(oneshot::Sender<()>),
}

/// Sending side of the sync queue. Every method returns immediately, except [SyncHandle::flush].
#[derive(Debug, Clone)]
pub struct SyncHandle {
    sender: mpsc::UnboundedSender<SyncCommand>,
}

impl SyncHandle {
    fn send(&self, command: SyncCommand) {
        if let Err(e) = self.sender.send(command) {
            debug!("Sync queue is closed, dropping {:?}", e.0);
        }
    }

    pub fn push(&self, path: String, value: Value) {
        self.send(SyncCommand::Push { path, value });
    }

    pub fn pull(&self, path: String, target: PullTarget) {
        self.send(SyncCommand::Pull { path, target });
    }

    /// Waits until everything queued before this call has been processed. Returns right away
    /// if the queue was shut down.
    pub async fn flush(&self) {
        let (sender, receiver) = oneshot::channel();
        self.send(SyncCommand::Flush(sender));
        let _ = receiver.await;
    }
}

/// Background task replicating local changes. Commands are processed one at a time in the order
/// they were queued. There is no ordering with respect to local reads and writes made meanwhile,
/// so a pull may land after a newer local write and replace it.
pub struct SyncQueue {
    handle: SyncHandle,
    shutdown: CancellationToken,
    worker: JoinHandle<()>,
}

impl SyncQueue {
    /// Spawns the worker on the current tokio runtime.
    pub fn start(
        mirror: Arc<dyn RemoteMirror>,
        store: Arc<dyn LocalStore>,
        notifier: Notifier,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let worker = SyncWorker {
            receiver,
            mirror,
            store,
            notifier,
            shutdown: shutdown.clone(),
        };
        Self {
            handle: SyncHandle { sender },
            shutdown,
            worker: tokio::spawn(worker.run()),
        }
    }

    pub fn handle(&self) -> SyncHandle {
        self.handle.clone()
    }

    /// Stops the worker after its in-flight command. Queued commands are dropped.
    pub async fn shutdown(self) -> Result<()> {
        self.shutdown.cancel();
        self.worker.await?;
        Ok(())
    }
}

struct SyncWorker {
    receiver: mpsc::UnboundedReceiver<SyncCommand>,
    mirror: Arc<dyn RemoteMirror>,
    store: Arc<dyn LocalStore>,
    notifier: Notifier,
    shutdown: CancellationToken,
}

impl SyncWorker {
    async fn run(mut self) {
        loop {
            let command = select! {
                _ = self.shutdown.cancelled() => break,
                command = self.receiver.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
            };
            self.process(command).await;
        }
        self.receiver.close();
        info!("Sync queue stopped");
    }

    async fn process(&self, command: SyncCommand) {
        match command {
            SyncCommand::Push { path, value } => match self.mirror.push(&path, &value).await {
                Ok(()) => debug!("Pushed {path}"),
                Err(e) => warn!("Failed to push {path}, keeping local state only: {e:?}"),
            },
            SyncCommand::Pull { path, target } => match self.mirror.pull(&path).await {
                Ok(Some(value)) => {
                    if let Err(e) = self.apply_pulled(target, value) {
                        warn!("Failed to apply pulled {path}: {e:?}");
                    }
                }
                Ok(None) => debug!("Remote has nothing at {path}"),
                Err(e) => warn!("Failed to pull {path}, keeping local state only: {e:?}"),
            },
            SyncCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    /// Remote wins: a decodable value replaces the local one and the dependent views are told to
    /// render again. Values of the wrong shape are ignored.
    fn apply_pulled(&self, target: PullTarget, value: Value) -> Result<()> {
        match target {
            PullTarget::Tasks => {
                let tasks = match serde_json::from_value::<Vec<Task>>(value) {
                    Ok(tasks) => tasks,
                    Err(e) => {
                        warn!("Remote task list is malformed, ignoring it: {e}");
                        return Ok(());
                    }
                };
                write_json(self.store.as_ref(), TASKS_KEY, &tasks)?;
                self.notifier.notify_all(&[Refresh::TaskList, Refresh::Calendar]);
            }
            PullTarget::Title => {
                let Value::String(title) = value else {
                    warn!("Remote title is not a string, ignoring it");
                    return Ok(());
                };
                self.store.set(TITLE_KEY, &title)?;
                self.notifier.notify(Refresh::Title);
            }
        }
        debug!("Applied remote {target:?}");
        Ok(())
    }
}
