use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};
use uuid::Uuid;

use crate::analysis::prompts::prepare_instructions;
use crate::inference::InferenceService;
use crate::kv::KeyValueStore;
use crate::models::resume::{Feedback, FeedbackState, Resume};
use crate::rasterize::DocumentRasterizer;
use crate::state::AppState;
use crate::storage::ObjectStore;

/// Progress notification emitted once per stage. The sequence is observable
/// by UI consumers but carries no correctness weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageProgress {
    UploadingResume,
    Converting,
    UploadingImage,
    Preparing,
    Analyzing,
    Complete,
}

impl StageProgress {
    pub fn message(&self) -> &'static str {
        match self {
            StageProgress::UploadingResume => "Uploading the file...",
            StageProgress::Converting => "Converting to image...",
            StageProgress::UploadingImage => "Uploading the image...",
            StageProgress::Preparing => "Preparing data...",
            StageProgress::Analyzing => "Analyzing...",
            StageProgress::Complete => "Analysis complete",
        }
    }
}

impl fmt::Display for StageProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// One distinct variant per fallible stage, so a caller can always tell
/// which stage of the submission failed from the message alone.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Failed to upload file: {0}")]
    UploadResume(String),

    #[error("Failed to convert PDF to image: {0}")]
    Convert(String),

    #[error("Failed to upload image: {0}")]
    UploadImage(String),

    #[error("Failed to persist resume record: {0}")]
    Persist(String),

    #[error("Failed to analyze resume: {0}")]
    Analyze(String),

    /// The inference service answered, but its payload is not valid feedback
    /// JSON. Fatal for this submission; the placeholder record stays pending.
    #[error("Malformed feedback payload: {0}")]
    MalformedFeedback(#[from] serde_json::Error),
}

/// A submission: the raw document plus the job context it is scored against.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub filename: String,
    pub document: Bytes,
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
}

/// Drives one submission through its six stages: upload the original,
/// rasterize the first page, upload the raster, persist a placeholder
/// record, run the critique, finalize the record.
///
/// Stages run strictly in order, each gated on the previous one. Nothing is
/// retried and nothing is rolled back: a failure aborts the submission and
/// leaves whatever earlier stages already wrote (documented per stage).
/// Re-submission always mints a fresh id; it never resumes a partial attempt.
pub struct AnalysisPipeline {
    store: Arc<dyn ObjectStore>,
    rasterizer: Arc<dyn DocumentRasterizer>,
    ai: Arc<dyn InferenceService>,
    kv: Arc<dyn KeyValueStore>,
}

impl AnalysisPipeline {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        rasterizer: Arc<dyn DocumentRasterizer>,
        ai: Arc<dyn InferenceService>,
        kv: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            store,
            rasterizer,
            ai,
            kv,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.store.clone(),
            state.rasterizer.clone(),
            state.ai.clone(),
            state.kv.clone(),
        )
    }

    pub async fn submit(
        &self,
        request: SubmitRequest,
        progress: Option<UnboundedSender<StageProgress>>,
    ) -> Result<Resume, AnalysisError> {
        let SubmitRequest {
            filename,
            document,
            company_name,
            job_title,
            job_description,
        } = request;

        // Stage 1: upload the original. Failing here writes nothing anywhere.
        notify(&progress, StageProgress::UploadingResume);
        let resume_path = self
            .store
            .upload(&filename, "application/pdf", document.clone())
            .await
            .map_err(|e| AnalysisError::UploadResume(e.to_string()))?;

        // Stage 2: rasterize the first page. Failing here leaves the stage-1
        // object orphaned in storage; only the wipe ever reclaims it.
        notify(&progress, StageProgress::Converting);
        let rasterizer = Arc::clone(&self.rasterizer);
        let doc = document.clone();
        let page = tokio::task::spawn_blocking(move || rasterizer.rasterize_first_page(&doc))
            .await
            .map_err(|e| AnalysisError::Convert(e.to_string()))?
            .map_err(|e| AnalysisError::Convert(e.to_string()))?;
        debug!("Rasterized first page to {}x{}", page.width, page.height);

        // Stage 3: upload the raster.
        notify(&progress, StageProgress::UploadingImage);
        let image_name = format!("{}.png", file_stem(&filename));
        let image_path = self
            .store
            .upload(&image_name, "image/png", Bytes::from(page.png))
            .await
            .map_err(|e| AnalysisError::UploadImage(e.to_string()))?;

        // Stage 4: durable placeholder before the expensive inference call.
        // A crash past this point leaves a visible pending record, not lost
        // context.
        notify(&progress, StageProgress::Preparing);
        let mut resume = Resume {
            id: Uuid::new_v4().to_string(),
            resume_path,
            image_path,
            company_name,
            job_title,
            job_description,
            feedback: FeedbackState::Pending,
        };
        self.persist(&resume).await?;

        // Stage 5: run the critique.
        notify(&progress, StageProgress::Analyzing);
        let instructions = prepare_instructions(&resume.job_title, &resume.job_description);
        let response = self
            .ai
            .feedback(&document, &instructions)
            .await
            .map_err(|e| AnalysisError::Analyze(e.to_string()))?;
        let text = response
            .text()
            .ok_or_else(|| AnalysisError::Analyze("inference returned no content".to_string()))?;

        // Stage 6: parse and finalize. The only place a record mutates.
        let feedback: Feedback = serde_json::from_str(text)?;
        resume.feedback = FeedbackState::Ready(feedback);
        self.persist(&resume).await?;

        notify(&progress, StageProgress::Complete);
        info!("Analysis complete for resume {}", resume.id);
        Ok(resume)
    }

    async fn persist(&self, resume: &Resume) -> Result<(), AnalysisError> {
        let encoded =
            serde_json::to_string(resume).map_err(|e| AnalysisError::Persist(e.to_string()))?;
        self.kv
            .set(&resume.storage_key(), &encoded)
            .await
            .map_err(|e| AnalysisError::Persist(e.to_string()))
    }
}

fn notify(progress: &Option<UnboundedSender<StageProgress>>, stage: StageProgress) {
    info!("{stage}");
    if let Some(tx) = progress {
        // An abandoned receiver must not fail the submission.
        let _ = tx.send(stage);
    }
}

fn file_stem(filename: &str) -> &str {
    filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(filename)
}
