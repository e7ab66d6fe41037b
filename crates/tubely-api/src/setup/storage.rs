//! Storage setup and initialization

use anyhow::Result;
use std::sync::Arc;
use tubely_core::Config;
use tubely_storage::{create_storage, LocalStorage, Storage};

/// Build the video object store and the local thumbnail assets store
pub async fn setup_storage(config: &Config) -> Result<(Arc<dyn Storage>, Arc<dyn Storage>)> {
    tracing::info!("Initializing storage abstraction...");
    let videos = create_storage(config).await?;
    tracing::info!(
        backend = %videos.backend_type(),
        "Video storage initialized successfully"
    );

    let assets = LocalStorage::new(
        config.assets_root(),
        config.assets_base_url().to_string(),
    )
    .await?;
    tracing::info!(
        assets_root = %config.assets_root().display(),
        assets_base_url = %config.assets_base_url(),
        "Thumbnail assets store initialized"
    );

    Ok((videos, Arc::new(assets)))
}
