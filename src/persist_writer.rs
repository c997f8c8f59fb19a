// src/persist_writer.rs - background writer for the favorites blob
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::{debug, error, info, trace, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::{KeyValueStore, QuoteError, Result};

#[derive(Debug, Clone, Default)]
pub struct PersistStatus {
    /// Whether the writer task is running
    pub is_running: bool,
    /// Snapshots written successfully
    pub writes_completed: usize,
    /// Snapshots whose write failed and was dropped
    pub writes_failed: usize,
    /// The time the last successful write finished
    pub last_write_time: Option<DateTime<Utc>>,
    /// The error from the most recent failed write
    pub last_error: Option<String>,
}

#[derive(Debug)]
pub enum PersistCommand {
    /// Replace the stored blob with this snapshot
    Write(String),
    /// Reply once every command queued before this one has been handled
    Flush(oneshot::Sender<()>),
    /// Stop the writer task
    Stop,
}

/// Serializes writes of the favorites blob onto one task so snapshots land
/// in the order they were taken. Callers never wait on a write.
pub struct PersistWriter {
    /// Channel to send commands to the writer task
    command_tx: mpsc::UnboundedSender<PersistCommand>,

    /// Handle to the writer task
    writer_task: Option<JoinHandle<()>>,

    /// Shared with the writer task
    status: Arc<Mutex<PersistStatus>>,
}

impl PersistWriter {
    /// Spawns the writer task on the current tokio runtime.
    pub fn spawn(kv: Arc<dyn KeyValueStore>, key: String) -> Self {
        info!("Starting persistence writer for key '{}'", key);
        let (command_tx, mut command_rx) = mpsc::unbounded_channel();
        let status = Arc::new(Mutex::new(PersistStatus {
            is_running: true,
            ..Default::default()
        }));
        let task_status = Arc::clone(&status);

        let task = tokio::spawn(async move {
            while let Some(cmd) = command_rx.recv().await {
                match cmd {
                    PersistCommand::Write(snapshot) => {
                        trace!("Writing favorites snapshot ({} bytes)", snapshot.len());
                        let outcome = kv.set(&key, snapshot).await;
                        if let Ok(mut status) = task_status.lock() {
                            match &outcome {
                                Ok(()) => {
                                    status.writes_completed += 1;
                                    status.last_write_time = Some(Utc::now());
                                }
                                Err(e) => {
                                    status.writes_failed += 1;
                                    status.last_error = Some(e.to_string());
                                }
                            }
                        }
                        match outcome {
                            Ok(()) => debug!("Favorites persisted under '{}'", key),
                            Err(e) => error!("Failed to persist favorites: {}", e),
                        }
                    }
                    PersistCommand::Flush(reply) => {
                        let _ = reply.send(());
                    }
                    PersistCommand::Stop => {
                        info!("Persistence writer stopping...");
                        break;
                    }
                }
            }

            if let Ok(mut status) = task_status.lock() {
                status.is_running = false;
            }
        });

        Self {
            command_tx,
            writer_task: Some(task),
            status,
        }
    }

    /// Queues a snapshot for writing. Failures are logged by the writer.
    pub fn queue(&self, snapshot: String) {
        if self
            .command_tx
            .send(PersistCommand::Write(snapshot))
            .is_err()
        {
            warn!("Persistence writer is not running; snapshot dropped");
        }
    }

    /// Waits until every snapshot queued so far has been handled.
    pub async fn flush(&self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(PersistCommand::Flush(reply_tx))
            .map_err(|e| QuoteError::ApplicationError {
                message: format!("Failed to send flush command: {}", e),
            })?;

        reply_rx.await.map_err(|e| QuoteError::ApplicationError {
            message: format!("Persistence writer went away during flush: {}", e),
        })
    }

    /// Drains queued writes and stops the writer task.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.writer_task.take() {
            if let Err(e) = self.command_tx.send(PersistCommand::Stop) {
                error!("Failed to send stop command to persistence writer: {}", e);
            }

            if let Err(e) = task.await {
                let error_mgs = format!("Failed to stop persistence writer: {}", e);
                error!("{}", error_mgs);
                return Err(QuoteError::ApplicationError { message: error_mgs });
            }

            info!("Persistence writer stopped");
        } else {
            debug!("Persistence writer is not running");
        }

        Ok(())
    }

    /// Get the current status of the writer
    pub fn get_status(&self) -> PersistStatus {
        self.status
            .lock()
            .map(|status| status.clone())
            .unwrap_or_default()
    }
}
