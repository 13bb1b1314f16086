//! The file intake session.
//!
//! Holds the ordered list of files a client has dropped in, enforces the
//! intake capacity on every add, and drives each accepted file through the
//! simulated processing lifecycle on a background task.

pub mod models;
mod processor;

pub use models::{content_url, AddOutcome, IncomingFile, SessionSnapshot, UploadedFile};
pub use processor::progress;

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::bridge;
use crate::config::ProcessingConfig;
use crate::object_store::{ObjectStore, ObjectStoreError};
use crate::state_machine::FileStatus;
use crate::validation::{validation_error, FileLimits};

pub const PROCESSING_FAILED: &str = "Failed to process file";

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("Intake session is closed")]
    Closed,
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Failed to remove {name}")]
    Remove {
        name: String,
        #[source]
        source: ObjectStoreError,
    },
    #[error("Failed to clear some files")]
    Clear { failed: usize },
}

#[derive(Clone)]
pub struct Intake {
    files: Arc<RwLock<Vec<UploadedFile>>>,
    store: Arc<dyn ObjectStore>,
    limits: FileLimits,
    processing: ProcessingConfig,
    upload_dir: String,
    shutdown: CancellationToken,
}

impl Intake {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        limits: FileLimits,
        processing: ProcessingConfig,
        upload_dir: impl Into<String>,
    ) -> Self {
        Self {
            files: Arc::new(RwLock::new(Vec::new())),
            store,
            limits,
            processing,
            upload_dir: upload_dir.into(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn limits(&self) -> &FileLimits {
        &self.limits
    }

    fn ensure_open(&self) -> Result<(), IntakeError> {
        if self.shutdown.is_cancelled() {
            return Err(IntakeError::Closed);
        }
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Snapshot of the session's files in the order they were added.
    pub async fn files(&self) -> Vec<UploadedFile> {
        self.files.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<UploadedFile> {
        self.files.read().await.iter().find(|f| f.id == id).cloned()
    }

    /// Files plus their derived usage, read under one lock.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let files = self.files.read().await.clone();
        let total_size = files.iter().map(|f| f.size).sum();
        SessionSnapshot {
            is_at_capacity: files.len() >= self.limits.max_files,
            remaining_space: self.limits.max_total_size.saturating_sub(total_size),
            total_size,
            files,
        }
    }

    pub async fn total_size(&self) -> u64 {
        self.snapshot().await.total_size
    }

    pub async fn remaining_space(&self) -> u64 {
        self.snapshot().await.remaining_space
    }

    pub async fn is_at_capacity(&self) -> bool {
        self.snapshot().await.is_at_capacity
    }

    /// Paths the dev bridge currently holds in the upload directory.
    pub async fn stored_files(&self) -> Vec<String> {
        bridge::load_stored_files(self.store.as_ref(), &self.upload_dir).await
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Validate and append a batch of files, then schedule their processing.
    ///
    /// Each file is checked against everything already held, including files
    /// accepted earlier in the same batch.
    pub async fn add_files(&self, incoming: Vec<IncomingFile>) -> Result<AddOutcome, IntakeError> {
        self.ensure_open()?;

        let mut outcome = AddOutcome::default();
        {
            let mut files = self.files.write().await;
            for file in incoming {
                if files.len() >= self.limits.max_files {
                    outcome.errors.push(format!(
                        "Cannot upload \"{}\" - Maximum {} files limit reached",
                        file.name, self.limits.max_files
                    ));
                    continue;
                }

                if let Some(err) = validation_error(&file, files.as_slice(), &self.limits) {
                    outcome.errors.push(format!("{}: {err}", file.name));
                    continue;
                }

                let record = UploadedFile::accept(file);
                files.push(record.clone());
                outcome.added.push(record);
            }
        }

        if !outcome.errors.is_empty() {
            tracing::warn!(rejected = outcome.errors.len(), "{}", outcome.errors.join("\n"));
        }

        if !outcome.added.is_empty() {
            let count = outcome.added.len();
            tracing::info!(
                added = count,
                "Added {count} file{}",
                if count == 1 { "" } else { "s" }
            );
            for record in &outcome.added {
                tokio::spawn(processor::process(self.clone(), record.id.clone()));
            }
        }

        Ok(outcome)
    }

    /// Remove one file, deleting its stored copy first.
    /// If the stored copy cannot be deleted the file stays in the session.
    pub async fn remove_file(&self, id: &str) -> Result<UploadedFile, IntakeError> {
        self.ensure_open()?;

        let target = self
            .get(id)
            .await
            .ok_or_else(|| IntakeError::NotFound(id.to_string()))?;

        if let Some(ref path) = target.stored_path {
            match bridge::delete_file(self.store.as_ref(), path).await {
                Ok(()) | Err(ObjectStoreError::NotFound(_)) => {}
                Err(e) => {
                    tracing::error!(file_id = %id, error = %e, "Failed to remove {}", target.name);
                    return Err(IntakeError::Remove {
                        name: target.name,
                        source: e,
                    });
                }
            }
        }

        let removed = {
            let mut files = self.files.write().await;
            let index = files
                .iter()
                .position(|f| f.id == id)
                .ok_or_else(|| IntakeError::NotFound(id.to_string()))?;
            files.remove(index)
        };

        // Processing may have finished while the old copy was being deleted.
        if removed.stored_path != target.stored_path {
            if let Some(ref path) = removed.stored_path {
                self.discard_late_copy(path).await;
            }
        }

        tracing::info!(file_id = %id, "Removed {}", removed.name);
        Ok(removed)
    }

    /// Remove every file. Stored copies are deleted concurrently; if any
    /// deletion fails nothing is removed from the session.
    pub async fn clear_files(&self) -> Result<usize, IntakeError> {
        self.ensure_open()?;

        let snapshot = self.files().await;

        let mut deletions = JoinSet::new();
        for path in snapshot.iter().filter_map(|f| f.stored_path.clone()) {
            let store = Arc::clone(&self.store);
            deletions.spawn(async move {
                match bridge::delete_file(store.as_ref(), &path).await {
                    Ok(()) | Err(ObjectStoreError::NotFound(_)) => Ok(()),
                    Err(e) => Err((path, e)),
                }
            });
        }

        let mut failed = 0;
        while let Some(joined) = deletions.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err((path, e))) => {
                    tracing::error!(path = %path, error = %e, "Failed to delete stored file");
                    failed += 1;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Deletion task failed");
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(IntakeError::Clear { failed });
        }

        let removed: Vec<UploadedFile> = {
            let mut files = self.files.write().await;
            let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut *files)
                .into_iter()
                .partition(|f| snapshot.iter().any(|s| s.id == f.id));
            *files = kept;
            removed
        };

        // Copies saved by processing that completed during the deletions above.
        for file in &removed {
            let Some(ref path) = file.stored_path else {
                continue;
            };
            let known = snapshot
                .iter()
                .any(|s| s.id == file.id && s.stored_path.as_ref() == Some(path));
            if !known {
                self.discard_late_copy(path).await;
            }
        }

        let cleared = removed.len();
        tracing::info!(cleared, "Cleared all files");
        Ok(cleared)
    }

    /// Best-effort delete of a stored copy that appeared after a removal
    /// decided what to delete.
    async fn discard_late_copy(&self, path: &str) {
        match bridge::delete_file(self.store.as_ref(), path).await {
            Ok(()) | Err(ObjectStoreError::NotFound(_)) => {}
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Failed to delete late stored file");
            }
        }
    }

    /// Close the session. Further operations fail with `Closed` and pending
    /// processing stops without touching file state.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    // ========================================================================
    // Status transitions (used by the processor)
    // ========================================================================

    /// Apply `next` to a file if the lifecycle allows it. Returns false when
    /// the file is gone, the move is illegal, or the session is closed.
    async fn transition<F>(&self, id: &str, next: FileStatus, update: F) -> bool
    where
        F: FnOnce(&mut UploadedFile),
    {
        if self.shutdown.is_cancelled() {
            return false;
        }

        let mut files = self.files.write().await;
        let Some(file) = files.iter_mut().find(|f| f.id == id) else {
            return false;
        };

        if !file.status.can_transition_to(next) {
            tracing::warn!(
                file_id = %id,
                from = ?file.status,
                to = ?next,
                "Ignoring illegal status transition"
            );
            return false;
        }

        file.status = next;
        update(file);
        true
    }

    fn processing_delay(&self) -> Duration {
        let jitter_ms = self.processing.jitter.as_millis() as u64;
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..jitter_ms)
        };
        self.processing.delay + Duration::from_millis(extra)
    }
}
