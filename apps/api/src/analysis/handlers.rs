use axum::extract::{Multipart, State};
use axum::Json;
use bytes::Bytes;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::analysis::{AnalysisPipeline, SubmitRequest};
use crate::errors::AppError;
use crate::models::resume::Resume;
use crate::state::AppState;

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub resume: Resume,
    /// Stage messages observed during the submission, in order.
    pub progress: Vec<String>,
}

/// POST /api/v1/resumes
///
/// Multipart fields: `company-name`, `job-title`, `job-description`, `file`.
pub async fn handle_analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let mut company_name = String::new();
    let mut job_title = String::new();
    let mut job_description = String::new();
    let mut file: Option<(String, Bytes)> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        match field.name().unwrap_or_default() {
            "company-name" => company_name = field.text().await.map_err(bad_multipart)?,
            "job-title" => job_title = field.text().await.map_err(bad_multipart)?,
            "job-description" => job_description = field.text().await.map_err(bad_multipart)?,
            "file" => {
                let filename = field
                    .file_name()
                    .unwrap_or("resume.pdf")
                    .to_string();
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                file = Some((filename, bytes));
            }
            _ => {}
        }
    }

    let (filename, document) =
        file.ok_or_else(|| AppError::Validation("Missing 'file' field".to_string()))?;
    if document.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }

    let pipeline = AnalysisPipeline::from_state(&state);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let resume = pipeline
        .submit(
            SubmitRequest {
                filename,
                document,
                company_name,
                job_title,
                job_description,
            },
            Some(tx),
        )
        .await?;

    let mut progress = Vec::new();
    while let Ok(stage) = rx.try_recv() {
        progress.push(stage.to_string());
    }

    Ok(Json(AnalyzeResponse { resume, progress }))
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Invalid multipart request: {e}"))
}
