//! Test helpers: build AppState and router for integration tests.
//!
//! External media tools are replaced by fakes; objects land in temp
//! directories through `LocalStorage`.

#![allow(dead_code)]

pub mod fakes;

use axum::Router;
use axum_test::TestServer;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tubely_api::auth::JwtService;
use tubely_api::setup::routes;
use tubely_api::state::{AppState, ThumbnailStore};
use tubely_core::models::Video;
use tubely_core::{Config, IngestConfig, ServerConfig, StorageBackend};
use tubely_db::{InMemoryVideoRepository, VideoRepository};
use tubely_processing::{IngestPipeline, TempStager};
use tubely_storage::{LocalStorage, OsRandom, Storage};
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-at-least-32-characters-long";
pub const BUCKET_URL: &str = "http://localhost:4566/tubely-videos";
pub const ASSETS_URL: &str = "http://localhost:4000/assets";

pub struct TestAppOptions {
    /// Geometry the fake prober reports; `None` makes probing fail
    pub geometry: Option<(u32, u32)>,
    pub max_video_size_bytes: usize,
}

impl Default for TestAppOptions {
    fn default() -> Self {
        Self {
            geometry: Some((1280, 720)),
            max_video_size_bytes: 1024 * 1024,
        }
    }
}

/// Test application: server, repository handle and owned temp dirs.
pub struct TestApp {
    pub server: TestServer,
    /// Same routes as `server`, for requests `TestServer` cannot build
    pub router: Router,
    pub videos: InMemoryVideoRepository,
    pub jwt: JwtService,
    pub scratch: TempDir,
    pub bucket: TempDir,
    pub assets: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn token_for(&self, user_id: Uuid) -> String {
        self.jwt
            .issue_token(user_id, chrono::Duration::hours(1))
            .expect("Failed to sign test token")
    }

    /// Insert a draft video owned by `user_id`
    pub async fn seed_video(&self, user_id: Uuid) -> Video {
        self.videos
            .create_video(Video::new(
                user_id,
                "Boots".to_string(),
                "A pair of boots".to_string(),
            ))
            .await
            .expect("Failed to seed video")
    }

    pub fn scratch_files(&self) -> Vec<PathBuf> {
        list_files(self.scratch.path())
    }

    pub fn bucket_files(&self) -> Vec<PathBuf> {
        list_files(self.bucket.path())
    }

    pub fn asset_files(&self) -> Vec<PathBuf> {
        list_files(self.assets.path())
    }
}

fn list_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).expect("Failed to read dir") {
        let path = entry.expect("Failed to read entry").path();
        if path.is_dir() {
            files.extend(list_files(&path));
        } else {
            files.push(path);
        }
    }
    files
}

pub fn create_test_config(
    assets_root: &Path,
    scratch_dir: &Path,
    bucket_dir: &Path,
    max_video_size_bytes: usize,
) -> Config {
    Config(Box::new(IngestConfig {
        base: ServerConfig {
            server_port: 4000,
            cors_origins: vec!["*".to_string()],
            jwt_secret: TEST_JWT_SECRET.to_string(),
            environment: "test".to_string(),
        },
        storage_backend: Some(StorageBackend::Local),
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        aws_region: None,
        local_storage_path: Some(bucket_dir.to_string_lossy().into_owned()),
        local_storage_base_url: Some(BUCKET_URL.to_string()),
        assets_root: assets_root.to_path_buf(),
        assets_base_url: ASSETS_URL.to_string(),
        max_video_size_bytes,
        video_allowed_content_types: vec!["video/mp4".to_string()],
        max_thumbnail_size_bytes: 1024 * 1024,
        thumbnail_allowed_content_types: vec!["image/jpeg".to_string(), "image/png".to_string()],
        ffprobe_path: "ffprobe".to_string(),
        ffmpeg_path: "ffmpeg".to_string(),
        process_timeout_secs: 5,
        scratch_dir: Some(scratch_dir.to_path_buf()),
    }))
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(TestAppOptions::default()).await
}

pub async fn setup_test_app_with(options: TestAppOptions) -> TestApp {
    let scratch = tempfile::tempdir().expect("Failed to create scratch dir");
    let bucket = tempfile::tempdir().expect("Failed to create bucket dir");
    let assets = tempfile::tempdir().expect("Failed to create assets dir");

    let config = create_test_config(
        assets.path(),
        scratch.path(),
        bucket.path(),
        options.max_video_size_bytes,
    );

    let video_storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(bucket.path(), BUCKET_URL.to_string())
            .await
            .expect("Failed to create video storage"),
    );
    let asset_storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(assets.path(), ASSETS_URL.to_string())
            .await
            .expect("Failed to create asset storage"),
    );

    let pipeline = IngestPipeline::new(
        TempStager::new(Some(scratch.path().to_path_buf())),
        Arc::new(fakes::FakeProber::new(options.geometry)),
        Arc::new(fakes::CopyRemuxer),
        Arc::new(OsRandom),
        video_storage,
    );

    let videos = InMemoryVideoRepository::new();
    let state = Arc::new(AppState {
        config: config.clone(),
        videos: Arc::new(videos.clone()),
        pipeline: Arc::new(pipeline),
        thumbnails: ThumbnailStore {
            storage: asset_storage,
            stager: TempStager::new(Some(scratch.path().to_path_buf())),
            random: Arc::new(OsRandom),
        },
    });

    let app = routes::setup_routes(&config, state).expect("Failed to setup routes");
    let server =
        TestServer::new(app.clone().into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        router: app,
        videos,
        jwt: JwtService::new(TEST_JWT_SECRET),
        scratch,
        bucket,
        assets,
    }
}
