pub mod health;

use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post},
    Router,
};

use crate::analysis;
use crate::resumes;
use crate::state::AppState;
use crate::studyplan;

/// Uploaded resumes are small; anything past this is a client mistake.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/resumes",
            post(analysis::handlers::handle_analyze)
                .get(resumes::handlers::handle_list)
                .delete(resumes::handlers::handle_wipe),
        )
        .route("/api/v1/resumes/:id", get(resumes::handlers::handle_get))
        .route(
            "/api/v1/resumes/:id/study-plan",
            post(studyplan::handlers::handle_study_plan),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
