//! Stand-ins for ffprobe and ffmpeg.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tubely_processing::{
    processed_path, MediaGeometry, MetadataProber, ProbeError, RemuxError, Remuxer,
};

pub struct FakeProber {
    geometry: Option<(u32, u32)>,
}

impl FakeProber {
    pub fn new(geometry: Option<(u32, u32)>) -> Self {
        Self { geometry }
    }
}

#[async_trait]
impl MetadataProber for FakeProber {
    async fn probe(&self, _path: &Path) -> Result<MediaGeometry, ProbeError> {
        let (width, height) = self.geometry.ok_or_else(|| ProbeError::Failed {
            status: "exit status: 1".to_string(),
            stderr: "Invalid data found when processing input".to_string(),
        })?;
        MediaGeometry::new(width, height).ok_or(ProbeError::InvalidGeometry {
            width: width as u64,
            height: height as u64,
        })
    }
}

/// Writes an identical copy at the processed path
pub struct CopyRemuxer;

#[async_trait]
impl Remuxer for CopyRemuxer {
    async fn remux(&self, input: &Path) -> Result<PathBuf, RemuxError> {
        let output = processed_path(input);
        tokio::fs::copy(input, &output)
            .await
            .map_err(|_| RemuxError::MissingOutput(output.clone()))?;
        Ok(output)
    }
}
