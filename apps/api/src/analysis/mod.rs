pub mod handlers;
pub mod pipeline;
pub mod prompts;

pub use pipeline::{AnalysisError, AnalysisPipeline, StageProgress, SubmitRequest};
