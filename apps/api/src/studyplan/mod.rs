pub mod handlers;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};

use crate::inference::{ChatMessage, ChatOptions, InferenceService};
use crate::kv::KeyValueStore;
use crate::models::resume::CategoryFeedback;
use crate::state::AppState;

/// Model used for study-plan generation. Fixed: every plan for every resume
/// comes from the same model.
pub const STUDY_PLAN_MODEL: &str = "claude-3-7-sonnet-20250219";

const STUDY_PLAN_PROMPT: &str = r#"You are a career skills planning assistant.
Generate a structured learning roadmap in markdown based on the skill
assessment below, where the "improve" entries are the skills the candidate
lacks or needs to strengthen. Cover:
- Core skills to build
- Recommended learning sequence
- Recommended courses and materials
- Estimated learning time per step
- Resulting competency for the position

Current skill data:
{skills_data}"#;

/// Derived cache key for one resume's study plan.
pub fn plan_key(resume_id: &str) -> String {
    format!("{resume_id}_plan")
}

/// Cache-aside study-plan generator.
///
/// A plan is written once per resume: the cache is consulted before the
/// inference call and populated create-if-absent afterwards, so concurrent
/// callers may both generate but only the first writer's text is ever
/// visible; every later lookup returns it verbatim.
pub struct StudyPlanCache {
    kv: Arc<dyn KeyValueStore>,
    ai: Arc<dyn InferenceService>,
}

impl StudyPlanCache {
    pub fn new(kv: Arc<dyn KeyValueStore>, ai: Arc<dyn InferenceService>) -> Self {
        Self { kv, ai }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.kv.clone(), state.ai.clone())
    }

    pub async fn get_or_generate(
        &self,
        resume_id: &str,
        skills: &CategoryFeedback,
    ) -> Result<String> {
        let key = plan_key(resume_id);

        if let Some(cached) = self.kv.get(&key).await? {
            debug!("Study plan cache hit for resume {resume_id}");
            return Ok(cached);
        }

        let skills_data =
            serde_json::to_string_pretty(skills).context("Failed to encode skill data")?;
        let prompt = STUDY_PLAN_PROMPT.replace("{skills_data}", &skills_data);

        let response = self
            .ai
            .chat(
                vec![ChatMessage::user(prompt)],
                ChatOptions {
                    model: STUDY_PLAN_MODEL,
                },
            )
            .await
            .context("Study plan generation failed")?;
        let text = response
            .text()
            .ok_or_else(|| anyhow!("Inference returned no study plan text"))?;

        // First writer wins; a lost race returns the winner's plan so every
        // caller observes the same cached text.
        if self.kv.set_if_absent(&key, text).await? {
            info!("Cached study plan for resume {resume_id}");
            return Ok(text.to_string());
        }
        match self.kv.get(&key).await? {
            Some(winner) => Ok(winner),
            None => Ok(text.to_string()),
        }
    }
}
