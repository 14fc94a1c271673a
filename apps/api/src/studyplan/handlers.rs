use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::errors::AppError;
use crate::resumes::ResumeRepository;
use crate::state::AppState;
use crate::studyplan::StudyPlanCache;

#[derive(Serialize)]
pub struct StudyPlanResponse {
    pub resume_id: String,
    /// Markdown roadmap, verbatim from the cache.
    pub study_plan: String,
}

/// POST /api/v1/resumes/:id/study-plan
pub async fn handle_study_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StudyPlanResponse>, AppError> {
    let resume = ResumeRepository::from_state(&state)
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;

    let feedback = resume.feedback.as_ready().ok_or_else(|| {
        AppError::UnprocessableEntity("Analysis has not completed for this resume".to_string())
    })?;

    let study_plan = StudyPlanCache::from_state(&state)
        .get_or_generate(&resume.id, &feedback.skills)
        .await?;

    Ok(Json(StudyPlanResponse {
        resume_id: resume.id,
        study_plan,
    }))
}
