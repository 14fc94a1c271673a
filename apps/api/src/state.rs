use std::sync::Arc;

use crate::config::Config;
use crate::inference::InferenceService;
use crate::kv::KeyValueStore;
use crate::rasterize::DocumentRasterizer;
use crate::storage::ObjectStore;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// This is the one service bundle: every external collaborator (key-value
/// namespace, artifact storage, inference, rasterizer) is reached through it,
/// never through a process-wide singleton.
#[derive(Clone)]
pub struct AppState {
    pub kv: Arc<dyn KeyValueStore>,
    pub store: Arc<dyn ObjectStore>,
    pub ai: Arc<dyn InferenceService>,
    pub rasterizer: Arc<dyn DocumentRasterizer>,
    pub config: Config,
}
