use crate::command::{run_tool, validate_tool_path, ToolError};
use crate::metadata::MediaGeometry;
use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("ffprobe exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("Failed to parse ffprobe output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No video stream found")]
    NoStreams,

    #[error("Invalid stream geometry {width}x{height}")]
    InvalidGeometry { width: u64, height: u64 },
}

/// Reads stream geometry from a local media file
#[async_trait]
pub trait MetadataProber: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<MediaGeometry, ProbeError>;
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    width: u64,
    #[serde(default)]
    height: u64,
}

/// Extract the first stream's geometry from ffprobe's JSON output.
pub fn parse_geometry(stdout: &[u8]) -> Result<MediaGeometry, ProbeError> {
    let output: ProbeOutput = serde_json::from_slice(stdout)?;
    let stream = output.streams.first().ok_or(ProbeError::NoStreams)?;

    let invalid = || ProbeError::InvalidGeometry {
        width: stream.width,
        height: stream.height,
    };
    let width = u32::try_from(stream.width).map_err(|_| invalid())?;
    let height = u32::try_from(stream.height).map_err(|_| invalid())?;
    MediaGeometry::new(width, height).ok_or_else(invalid)
}

/// [`MetadataProber`] backed by the `ffprobe` executable
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    ffprobe_path: String,
    timeout: Duration,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: impl Into<String>, timeout: Duration) -> Result<Self, ToolError> {
        let ffprobe_path = ffprobe_path.into();
        validate_tool_path(&ffprobe_path)?;
        Ok(Self {
            ffprobe_path,
            timeout,
        })
    }
}

#[async_trait]
impl MetadataProber for FfprobeProber {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    async fn probe(&self, path: &Path) -> Result<MediaGeometry, ProbeError> {
        let start = std::time::Instant::now();

        let mut args: Vec<&OsStr> = [
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-select_streams",
            "v:0",
        ]
        .into_iter()
        .map(OsStr::new)
        .collect();
        args.push(path.as_os_str());

        let output = run_tool(&self.ffprobe_path, args, self.timeout).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(status = %output.status, stderr = %stderr, "ffprobe failed");
            return Err(ProbeError::Failed {
                status: output.status.to_string(),
                stderr,
            });
        }

        let geometry = parse_geometry(&output.stdout)?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            width = geometry.width(),
            height = geometry.height(),
            "Video probe completed"
        );

        Ok(geometry)
    }
}
