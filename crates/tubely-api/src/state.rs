//! Application state shared by all handlers.

use std::sync::Arc;
use tubely_core::Config;
use tubely_db::VideoRepository;
use tubely_processing::{IngestPipeline, TempStager};
use tubely_storage::{RandomSource, Storage};

/// Local store for thumbnail images, served under `/assets`
#[derive(Clone)]
pub struct ThumbnailStore {
    pub storage: Arc<dyn Storage>,
    pub stager: TempStager,
    pub random: Arc<dyn RandomSource>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub videos: Arc<dyn VideoRepository>,
    pub pipeline: Arc<IngestPipeline>,
    pub thumbnails: ThumbnailStore,
}
