mod analysis;
mod config;
mod errors;
mod inference;
mod kv;
mod models;
mod rasterize;
mod resumes;
mod routes;
mod state;
mod storage;
mod studyplan;
#[cfg(test)]
mod testing;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::inference::AnthropicClient;
use crate::kv::RedisKv;
use crate::rasterize::PdfRasterizer;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::S3ObjectStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (panics on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ResumeMatch API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize Redis (key-value namespace for resume records and plans)
    let kv = RedisKv::connect(&config.redis_url).await?;
    info!("Redis connection established");

    // Initialize S3 / MinIO (artifact storage)
    let s3 = build_s3_client(&config).await;
    let store = S3ObjectStore::new(s3, config.s3_bucket.clone());
    info!("S3 client initialized");

    // Initialize inference client
    let ai = AnthropicClient::new(config.anthropic_api_key.clone());
    info!("Inference client initialized (model: {})", inference::FEEDBACK_MODEL);

    // Build app state: the one service bundle injected everywhere
    let state = AppState {
        kv: Arc::new(kv),
        store: Arc::new(store),
        ai: Arc::new(ai),
        rasterizer: Arc::new(PdfRasterizer),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "resumatch-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
