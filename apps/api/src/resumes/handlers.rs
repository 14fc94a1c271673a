use axum::extract::{Path, State};
use axum::Json;

use crate::errors::AppError;
use crate::models::resume::Resume;
use crate::resumes::{ResumeRepository, WipeReport};
use crate::state::AppState;

/// GET /api/v1/resumes
pub async fn handle_list(State(state): State<AppState>) -> Result<Json<Vec<Resume>>, AppError> {
    let resumes = ResumeRepository::from_state(&state).list_all().await?;
    Ok(Json(resumes))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Resume>, AppError> {
    let resume = ResumeRepository::from_state(&state)
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
    Ok(Json(resume))
}

/// DELETE /api/v1/resumes
///
/// Destructive and irreversible: deletes every stored artifact and clears
/// the whole key-value namespace.
pub async fn handle_wipe(State(state): State<AppState>) -> Result<Json<WipeReport>, AppError> {
    let report = ResumeRepository::from_state(&state).wipe_all().await?;
    Ok(Json(report))
}
