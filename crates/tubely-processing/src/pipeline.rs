//! Video ingest pipeline: stage → remux → probe → classify → key → upload.
//!
//! One run executes sequentially on the calling task. Every scratch file
//! created along the way is removed before [`IngestPipeline::ingest`] returns,
//! whatever the outcome.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::io::AsyncRead;
use tubely_core::Config;
use tubely_storage::{EntropyError, ObjectKey, OsRandom, RandomSource, Storage, StorageError};
use uuid::Uuid;

use crate::command::ToolError;
use crate::metadata::MediaGeometry;
use crate::staging::{StagingError, TempStager};
use crate::video::{
    processed_path, AspectClass, FfmpegRemuxer, FfprobeProber, MetadataProber, ProbeError,
    RemuxError, Remuxer,
};

/// One inbound upload
pub struct UploadRequest<R> {
    pub owner_id: Uuid,
    pub video_id: Uuid,
    /// Declared media type, e.g. `video/mp4`
    pub content_type: String,
    pub reader: R,
    pub byte_limit: u64,
}

/// Step marker, used for logging where a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Staging,
    Remuxing,
    Probing,
    Classifying,
    KeyGen,
    Uploading,
    Completed,
    Aborted,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Staging => "staging",
            PipelineState::Remuxing => "remuxing",
            PipelineState::Probing => "probing",
            PipelineState::Classifying => "classifying",
            PipelineState::KeyGen => "key_gen",
            PipelineState::Uploading => "uploading",
            PipelineState::Completed => "completed",
            PipelineState::Aborted => "aborted",
        }
    }
}

impl Display for PipelineState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Upload exceeds the limit of {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    #[error("Probe failed: {0}")]
    Probe(#[from] ProbeError),

    #[error("Remux failed: {0}")]
    Remux(#[from] RemuxError),

    #[error(transparent)]
    Entropy(#[from] EntropyError),

    #[error("Storage upload failed: {0}")]
    Storage(#[from] StorageError),
}

impl From<StagingError> for PipelineError {
    fn from(err: StagingError) -> Self {
        match err {
            StagingError::PayloadTooLarge { limit } => PipelineError::PayloadTooLarge { limit },
            StagingError::Io(e) => PipelineError::Io(e),
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct IngestedVideo {
    pub url: String,
    pub key: ObjectKey,
    pub geometry: MediaGeometry,
    pub aspect: AspectClass,
    /// Size of the uploaded (remuxed) object
    pub byte_length: u64,
}

/// Removes a scratch path when dropped. A missing file is not an error.
struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove scratch file"
            ),
        }
    }
}

/// Drives one upload from inbound stream to stored object
pub struct IngestPipeline {
    stager: TempStager,
    prober: Arc<dyn MetadataProber>,
    remuxer: Arc<dyn Remuxer>,
    random: Arc<dyn RandomSource>,
    storage: Arc<dyn Storage>,
}

impl IngestPipeline {
    pub fn new(
        stager: TempStager,
        prober: Arc<dyn MetadataProber>,
        remuxer: Arc<dyn Remuxer>,
        random: Arc<dyn RandomSource>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            stager,
            prober,
            remuxer,
            random,
            storage,
        }
    }

    /// Wire the ffprobe/ffmpeg implementations and the OS random source
    pub fn from_config(config: &Config, storage: Arc<dyn Storage>) -> Result<Self, ToolError> {
        let timeout = config.process_timeout();
        let prober = FfprobeProber::new(config.ffprobe_path(), timeout)?;
        let remuxer = FfmpegRemuxer::new(config.ffmpeg_path(), timeout)?;
        let stager = TempStager::new(config.scratch_dir().map(Path::to_path_buf));

        Ok(Self::new(
            stager,
            Arc::new(prober),
            Arc::new(remuxer),
            Arc::new(OsRandom),
            storage,
        ))
    }

    /// Run the full pipeline for one upload.
    ///
    /// Returns the first error encountered; nothing is retried.
    #[tracing::instrument(
        skip(self, request),
        fields(
            owner_id = %request.owner_id,
            video_id = %request.video_id,
            content_type = %request.content_type
        )
    )]
    pub async fn ingest<R>(
        &self,
        request: UploadRequest<R>,
    ) -> Result<IngestedVideo, PipelineError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let start = std::time::Instant::now();
        let mut state = PipelineState::Staging;

        let result = self.run(request, &mut state).await;

        match &result {
            Ok(video) => tracing::info!(
                state = %PipelineState::Completed,
                key = %video.key,
                aspect = %video.aspect,
                width = video.geometry.width(),
                height = video.geometry.height(),
                byte_length = video.byte_length,
                duration_ms = start.elapsed().as_millis(),
                "Video ingested"
            ),
            Err(e) => tracing::warn!(
                state = %PipelineState::Aborted,
                failed_step = %state,
                error = %e,
                duration_ms = start.elapsed().as_millis(),
                "Video ingest aborted"
            ),
        }

        result
    }

    async fn run<R>(
        &self,
        request: UploadRequest<R>,
        state: &mut PipelineState,
    ) -> Result<IngestedVideo, PipelineError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let content_type = normalize_content_type(&request.content_type)?;

        *state = PipelineState::Staging;
        let staged = self
            .stager
            .stage(request.reader, request.byte_limit)
            .await?;
        // Guard the remux target before ffmpeg runs; a failed remux may leave a partial file
        let _remux_target = ScratchFile::new(processed_path(staged.path()));

        *state = PipelineState::Remuxing;
        let processed = ScratchFile::new(self.remuxer.remux(staged.path()).await?);

        *state = PipelineState::Probing;
        let geometry = self.prober.probe(processed.path()).await?;

        *state = PipelineState::Classifying;
        let aspect = geometry.aspect_class();

        *state = PipelineState::KeyGen;
        let key = ObjectKey::generate(aspect.as_prefix(), &content_type, self.random.as_ref())?;

        *state = PipelineState::Uploading;
        let byte_length = tokio::fs::metadata(processed.path()).await?.len();
        let url = self
            .storage
            .put_file(&key.to_string(), processed.path(), &content_type, byte_length)
            .await?;

        if let Err(e) = staged.remove() {
            tracing::warn!(error = %e, "Failed to remove staged upload");
        }

        *state = PipelineState::Completed;
        Ok(IngestedVideo {
            url,
            key,
            geometry,
            aspect,
            byte_length,
        })
    }
}

/// Lowercase `type/subtype` without parameters
fn normalize_content_type(content_type: &str) -> Result<String, PipelineError> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    match mime.split_once('/') {
        Some((kind, subtype)) if !kind.is_empty() && !subtype.is_empty() => Ok(mime),
        _ => Err(PipelineError::Validation(format!(
            "Invalid content type: {}",
            content_type
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::io::Cursor;
    use std::sync::Mutex;
    use tempfile::{tempdir, TempDir};
    use tubely_storage::{LocalStorage, StorageBackend, StorageResult};

    const BASE_URL: &str = "http://localhost:9000/tubely-videos";

    struct FixedProber(Option<(u32, u32)>);

    #[async_trait]
    impl MetadataProber for FixedProber {
        async fn probe(&self, path: &Path) -> Result<MediaGeometry, ProbeError> {
            assert!(path.exists(), "probe must see the remuxed file");
            match self.0 {
                Some((w, h)) => MediaGeometry::new(w, h).ok_or(ProbeError::InvalidGeometry {
                    width: w as u64,
                    height: h as u64,
                }),
                None => Err(ProbeError::Failed {
                    status: "exit status: 1".to_string(),
                    stderr: "moov atom not found".to_string(),
                }),
            }
        }
    }

    /// Copies input to the processed path, optionally failing after a partial write
    struct CopyRemuxer {
        fail: bool,
    }

    #[async_trait]
    impl Remuxer for CopyRemuxer {
        async fn remux(&self, input: &Path) -> Result<PathBuf, RemuxError> {
            let output = processed_path(input);
            tokio::fs::copy(input, &output)
                .await
                .map_err(|e| RemuxError::MissingOutput(PathBuf::from(e.to_string())))?;
            if self.fail {
                return Err(RemuxError::Failed {
                    status: "exit status: 1".to_string(),
                    stderr: "Invalid data found when processing input".to_string(),
                });
            }
            Ok(output)
        }
    }

    struct ZeroRandom;

    impl RandomSource for ZeroRandom {
        fn secure_random_bytes(&self, len: usize) -> Result<Vec<u8>, EntropyError> {
            Ok(vec![0u8; len])
        }
    }

    struct BrokenRandom;

    impl RandomSource for BrokenRandom {
        fn secure_random_bytes(&self, _len: usize) -> Result<Vec<u8>, EntropyError> {
            Err(EntropyError("getrandom unavailable".to_string()))
        }
    }

    /// Records what it was asked to store, then fails
    #[derive(Default)]
    struct RejectingStorage {
        calls: Mutex<Vec<(String, String, u64)>>,
    }

    #[async_trait]
    impl Storage for RejectingStorage {
        async fn put_file(
            &self,
            key: &str,
            path: &Path,
            content_type: &str,
            content_length: u64,
        ) -> StorageResult<String> {
            assert!(path.exists());
            self.calls.lock().unwrap().push((
                key.to_string(),
                content_type.to_string(),
                content_length,
            ));
            Err(StorageError::UploadFailed("AccessDenied".to_string()))
        }

        fn object_url(&self, key: &str) -> String {
            format!("{}/{}", BASE_URL, key)
        }

        fn backend_type(&self) -> StorageBackend {
            StorageBackend::S3
        }
    }

    struct Harness {
        scratch: TempDir,
        bucket: TempDir,
        pipeline: IngestPipeline,
    }

    async fn harness(
        geometry: Option<(u32, u32)>,
        fail_remux: bool,
        random: Arc<dyn RandomSource>,
    ) -> Harness {
        let scratch = tempdir().unwrap();
        let bucket = tempdir().unwrap();
        let storage = LocalStorage::new(bucket.path(), BASE_URL.to_string())
            .await
            .unwrap();
        let pipeline = IngestPipeline::new(
            TempStager::new(Some(scratch.path().to_path_buf())),
            Arc::new(FixedProber(geometry)),
            Arc::new(CopyRemuxer { fail: fail_remux }),
            random,
            Arc::new(storage),
        );
        Harness {
            scratch,
            bucket,
            pipeline,
        }
    }

    fn request(body: &[u8], limit: u64) -> UploadRequest<Cursor<Vec<u8>>> {
        UploadRequest {
            owner_id: Uuid::new_v4(),
            video_id: Uuid::new_v4(),
            content_type: "video/mp4".to_string(),
            reader: Cursor::new(body.to_vec()),
            byte_limit: limit,
        }
    }

    fn scratch_is_empty(dir: &TempDir) -> bool {
        std::fs::read_dir(dir.path()).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn test_landscape_upload_end_to_end() {
        let h = harness(Some((1280, 720)), false, Arc::new(ZeroRandom)).await;

        let video = h
            .pipeline
            .ingest(request(b"mp4-bytes", 1024))
            .await
            .unwrap();

        let segment = "A".repeat(43);
        assert_eq!(video.key.to_string(), format!("landscape/{}.mp4", segment));
        assert_eq!(
            video.url,
            format!("{}/landscape/{}.mp4", BASE_URL, segment)
        );
        assert_eq!(video.aspect, AspectClass::Landscape);
        assert_eq!(video.byte_length, 9);

        let stored = h.bucket.path().join("landscape").join(format!("{}.mp4", segment));
        assert_eq!(std::fs::read(stored).unwrap(), b"mp4-bytes");
        assert!(scratch_is_empty(&h.scratch));
    }

    #[tokio::test]
    async fn test_prefix_follows_aspect_class() {
        for (dims, prefix) in [((1080, 1920), "portrait/"), ((1000, 1000), "other/")] {
            let h = harness(Some(dims), false, Arc::new(OsRandom)).await;
            let video = h.pipeline.ingest(request(b"x", 16)).await.unwrap();
            assert!(video.key.to_string().starts_with(prefix));
            assert!(scratch_is_empty(&h.scratch));
        }
    }

    #[tokio::test]
    async fn test_keys_do_not_repeat() {
        let h = harness(Some((1920, 1080)), false, Arc::new(OsRandom)).await;
        let mut seen = HashSet::new();
        for _ in 0..20 {
            let video = h.pipeline.ingest(request(b"clip", 16)).await.unwrap();
            assert!(!video.key.random_segment().contains('/'));
            assert!(seen.insert(video.key.to_string()));
        }
    }

    #[tokio::test]
    async fn test_probe_failure_aborts_and_cleans_up() {
        let h = harness(None, false, Arc::new(ZeroRandom)).await;

        let err = h.pipeline.ingest(request(b"junk", 1024)).await.unwrap_err();

        assert!(matches!(err, PipelineError::Probe(ProbeError::Failed { .. })));
        assert!(scratch_is_empty(&h.scratch));
        assert!(scratch_is_empty(&h.bucket));
    }

    #[tokio::test]
    async fn test_zero_geometry_is_probe_error() {
        let h = harness(Some((0, 720)), false, Arc::new(ZeroRandom)).await;
        let err = h.pipeline.ingest(request(b"junk", 1024)).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Probe(ProbeError::InvalidGeometry { .. })
        ));
        assert!(scratch_is_empty(&h.scratch));
    }

    #[tokio::test]
    async fn test_failed_remux_removes_partial_output() {
        let h = harness(Some((1280, 720)), true, Arc::new(ZeroRandom)).await;

        let err = h.pipeline.ingest(request(b"junk", 1024)).await.unwrap_err();

        match err {
            PipelineError::Remux(RemuxError::Failed { stderr, .. }) => {
                assert!(stderr.contains("Invalid data"))
            }
            other => panic!("expected remux failure, got {:?}", other),
        }
        assert!(scratch_is_empty(&h.scratch));
    }

    #[tokio::test]
    async fn test_entropy_failure_aborts() {
        let h = harness(Some((1280, 720)), false, Arc::new(BrokenRandom)).await;
        let err = h.pipeline.ingest(request(b"clip", 1024)).await.unwrap_err();
        assert!(matches!(err, PipelineError::Entropy(_)));
        assert!(scratch_is_empty(&h.scratch));
        assert!(scratch_is_empty(&h.bucket));
    }

    #[tokio::test]
    async fn test_oversized_upload_never_reaches_tools() {
        let h = harness(Some((1280, 720)), false, Arc::new(ZeroRandom)).await;
        let err = h
            .pipeline
            .ingest(request(&[1u8; 33], 32))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::PayloadTooLarge { limit: 32 }));
        assert!(scratch_is_empty(&h.scratch));
    }

    #[tokio::test]
    async fn test_storage_failure_propagates_and_cleans_up() {
        let scratch = tempdir().unwrap();
        let storage = Arc::new(RejectingStorage::default());
        let pipeline = IngestPipeline::new(
            TempStager::new(Some(scratch.path().to_path_buf())),
            Arc::new(FixedProber(Some((720, 1280)))),
            Arc::new(CopyRemuxer { fail: false }),
            Arc::new(ZeroRandom),
            storage.clone(),
        );

        let mut req = request(b"portrait-clip", 1024);
        req.content_type = "Video/MP4; codecs=avc1".to_string();
        let err = pipeline.ingest(req).await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Storage(StorageError::UploadFailed(_))
        ));
        let calls = storage.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, format!("portrait/{}.mp4", "A".repeat(43)));
        assert_eq!(calls[0].1, "video/mp4");
        assert_eq!(calls[0].2, 13);
        assert!(scratch_is_empty(&scratch));
    }

    #[tokio::test]
    async fn test_invalid_content_type_has_no_side_effects() {
        let h = harness(Some((1280, 720)), false, Arc::new(ZeroRandom)).await;
        let mut req = request(b"clip", 1024);
        req.content_type = "mp4".to_string();
        let err = h.pipeline.ingest(req).await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
        assert!(scratch_is_empty(&h.scratch));
    }

    #[test]
    fn test_state_names() {
        assert_eq!(PipelineState::Remuxing.to_string(), "remuxing");
        assert_eq!(PipelineState::KeyGen.to_string(), "key_gen");
        assert_eq!(PipelineState::Aborted.to_string(), "aborted");
    }
}
