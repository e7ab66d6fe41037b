//! Application setup and initialization

pub mod routes;
pub mod server;
pub mod storage;

use crate::state::{AppState, ThumbnailStore};
use anyhow::{Context, Result};
use std::sync::Arc;
use tubely_core::Config;
use tubely_db::InMemoryVideoRepository;
use tubely_processing::{IngestPipeline, TempStager};
use tubely_storage::OsRandom;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.environment())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!("Configuration loaded and validated successfully");

    let (video_storage, assets) = storage::setup_storage(&config).await?;

    let pipeline = IngestPipeline::from_config(&config, video_storage)
        .context("Failed to configure media tools")?;
    tracing::info!(
        ffprobe_path = %config.ffprobe_path(),
        ffmpeg_path = %config.ffmpeg_path(),
        process_timeout_secs = config.process_timeout().as_secs(),
        "Ingest pipeline ready"
    );

    let state = Arc::new(AppState {
        videos: Arc::new(InMemoryVideoRepository::new()),
        pipeline: Arc::new(pipeline),
        thumbnails: ThumbnailStore {
            storage: assets,
            stager: TempStager::new(config.scratch_dir().map(|p| p.to_path_buf()))
                .with_prefix("tubely-thumbnail"),
            random: Arc::new(OsRandom),
        },
        config: config.clone(),
    });

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
