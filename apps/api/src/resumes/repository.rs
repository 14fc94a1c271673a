use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::warn;

use crate::kv::KeyValueStore;
use crate::models::resume::{resume_key, Resume, RESUME_KEY_PATTERN};
use crate::state::AppState;
use crate::storage::ObjectStore;

/// Outcome of a bulk wipe. The operation is best-effort, not transactional:
/// `failed` lists artifacts that could not be deleted; the key-value flush
/// runs regardless.
#[derive(Debug, Serialize)]
pub struct WipeReport {
    pub deleted: usize,
    pub failed: Vec<String>,
}

/// Read/delete layer over the stored resume records. Creation and mutation
/// belong exclusively to the pipeline; the only deletion exposed anywhere is
/// the bulk wipe.
pub struct ResumeRepository {
    kv: Arc<dyn KeyValueStore>,
    store: Arc<dyn ObjectStore>,
}

impl ResumeRepository {
    pub fn new(kv: Arc<dyn KeyValueStore>, store: Arc<dyn ObjectStore>) -> Self {
        Self { kv, store }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.kv.clone(), state.store.clone())
    }

    /// Lists every stored resume. A malformed record is skipped and logged
    /// with its key; one corrupt entry never takes down the whole listing.
    pub async fn list_all(&self) -> Result<Vec<Resume>> {
        let entries = self
            .kv
            .list(RESUME_KEY_PATTERN, true)
            .await
            .context("Failed to list resume records")?;

        let mut resumes = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(value) = entry.value else {
                warn!("Resume record {} vanished during listing", entry.key);
                continue;
            };
            match serde_json::from_str::<Resume>(&value) {
                Ok(resume) => resumes.push(resume),
                Err(e) => warn!("Skipping malformed resume record {}: {e}", entry.key),
            }
        }
        Ok(resumes)
    }

    /// Fetches one resume by id; `None` when no record exists.
    pub async fn get(&self, id: &str) -> Result<Option<Resume>> {
        let Some(value) = self
            .kv
            .get(&resume_key(id))
            .await
            .context("Failed to read resume record")?
        else {
            return Ok(None);
        };
        let resume = serde_json::from_str(&value)
            .with_context(|| format!("Resume record {} is malformed", resume_key(id)))?;
        Ok(Some(resume))
    }

    /// Deletes every stored artifact, then flushes the entire key-value
    /// namespace. Individual deletion failures are collected, not fatal, and
    /// the flush still runs; already-deleted artifacts are never restored.
    pub async fn wipe_all(&self) -> Result<WipeReport> {
        let artifacts = self
            .store
            .list_root()
            .await
            .context("Failed to enumerate stored artifacts")?;

        let mut deleted = 0;
        let mut failed = Vec::new();
        for path in artifacts {
            match self.store.delete(&path).await {
                Ok(()) => deleted += 1,
                Err(e) => {
                    warn!("Failed to delete artifact {path}: {e}");
                    failed.push(path);
                }
            }
        }

        self.kv
            .flush()
            .await
            .context("Failed to flush key-value namespace")?;

        if failed.is_empty() {
            warn!("Wiped all history: {deleted} artifacts deleted, namespace flushed");
        } else {
            warn!(
                "Wipe incomplete: {deleted} artifacts deleted, {} left behind",
                failed.len()
            );
        }
        Ok(WipeReport { deleted, failed })
    }
}
