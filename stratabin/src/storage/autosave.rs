//! Debounced workspace autosave
//!
//! Watches the store's revision channel and writes a snapshot once changes
//! have stopped arriving for the configured delay. Bursts of edits (such as
//! typing) therefore cost one serialization instead of one per keystroke.

use super::persistence::PersistenceAdapter;
use crate::error::{AppError, Result};
use crate::workspace::WorkspaceStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;

enum Command {
    Flush(oneshot::Sender<Result<()>>),
    Shutdown,
}

/// Handle to the background autosave task
pub struct Autosave {
    commands: mpsc::Sender<Command>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Autosave {
    /// Start the autosave task for a store
    pub async fn spawn(
        store: Arc<Mutex<WorkspaceStore>>,
        persistence: PersistenceAdapter,
        delay: Duration,
    ) -> Self {
        // Revisions up to now are assumed to be persisted already
        let mut changes = store.lock().await.subscribe();
        let mut saved_revision = *changes.borrow_and_update();

        let (commands, mut command_rx) = mpsc::channel(8);

        let task = tokio::spawn(async move {
            tracing::info!("Autosave started (delay {:?})", delay);

            loop {
                tokio::select! {
                    changed = changes.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let wake = wait_for_quiet(&mut changes, &mut command_rx, delay).await;
                        let result = save(&store, &persistence, &mut saved_revision).await;
                        match wake {
                            Wake::Quiet => {
                                if let Err(e) = result {
                                    tracing::error!("Autosave failed: {}", e);
                                }
                            }
                            Wake::Flush(reply) => {
                                let _ = reply.send(result);
                            }
                            Wake::Stop => {
                                if let Err(e) = result {
                                    tracing::error!("Final autosave failed: {}", e);
                                }
                                break;
                            }
                        }
                    }
                    command = command_rx.recv() => {
                        let result = save(&store, &persistence, &mut saved_revision).await;
                        match command {
                            Some(Command::Flush(reply)) => {
                                let _ = reply.send(result);
                            }
                            Some(Command::Shutdown) | None => {
                                if let Err(e) = result {
                                    tracing::error!("Final autosave failed: {}", e);
                                }
                                break;
                            }
                        }
                    }
                }
            }

            tracing::info!("Autosave stopped");
        });

        Self {
            commands,
            task: Mutex::new(Some(task)),
        }
    }

    /// Write pending changes now
    pub async fn flush(&self) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Flush(reply))
            .await
            .map_err(|_| AppError::Storage("Autosave task is not running".to_string()))?;

        response
            .await
            .map_err(|_| AppError::Storage("Autosave task stopped during flush".to_string()))?
    }

    /// Write pending changes and stop the task
    pub async fn shutdown(&self) -> Result<()> {
        let Some(task) = self.task.lock().await.take() else {
            return Ok(());
        };

        // The task may already have exited; joining below is enough then
        let _ = self.commands.send(Command::Shutdown).await;

        task.await
            .map_err(|e| AppError::Storage(format!("Autosave task panicked: {}", e)))
    }
}

/// Why a debounce wait ended
enum Wake {
    Quiet,
    Flush(oneshot::Sender<Result<()>>),
    Stop,
}

/// Wait until no change arrives for `delay`, or a command cuts the wait short.
async fn wait_for_quiet(
    changes: &mut watch::Receiver<u64>,
    commands: &mut mpsc::Receiver<Command>,
    delay: Duration,
) -> Wake {
    loop {
        tokio::select! {
            changed = tokio::time::timeout(delay, changes.changed()) => {
                match changed {
                    Ok(Ok(())) => continue,
                    Ok(Err(_)) => return Wake::Stop,
                    Err(_) => return Wake::Quiet,
                }
            }
            command = commands.recv() => {
                return match command {
                    Some(Command::Flush(reply)) => Wake::Flush(reply),
                    Some(Command::Shutdown) | None => Wake::Stop,
                };
            }
        }
    }
}

async fn save(
    store: &Arc<Mutex<WorkspaceStore>>,
    persistence: &PersistenceAdapter,
    saved_revision: &mut u64,
) -> Result<()> {
    let (revision, snapshot) = {
        let store = store.lock().await;
        if store.revision() == *saved_revision {
            return Ok(());
        }
        (store.revision(), store.snapshot())
    };

    persistence.save(&snapshot).await?;
    *saved_revision = revision;

    tracing::debug!("Autosaved workspace at revision {}", revision);
    Ok(())
}
