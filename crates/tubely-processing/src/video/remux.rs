use crate::command::{run_tool, validate_tool_path, ToolError};
use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tubely_core::constants::PROCESSED_SUFFIX;

#[derive(Debug, Error)]
pub enum RemuxError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("ffmpeg exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("ffmpeg produced no output at {0}")]
    MissingOutput(PathBuf),
}

/// Rewrites a container so it can be played while still downloading
#[async_trait]
pub trait Remuxer: Send + Sync {
    /// Returns the path of the newly written file. The input is left untouched.
    async fn remux(&self, input: &Path) -> Result<PathBuf, RemuxError>;
}

/// Sibling output path for a remuxed file: `<input>.processed.mp4`
pub fn processed_path(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(PROCESSED_SUFFIX);
    PathBuf::from(name)
}

/// [`Remuxer`] that moves the MP4 index to the front with `ffmpeg`.
///
/// Streams are copied, never re-encoded.
#[derive(Debug, Clone)]
pub struct FfmpegRemuxer {
    ffmpeg_path: String,
    timeout: Duration,
}

impl FfmpegRemuxer {
    pub fn new(ffmpeg_path: impl Into<String>, timeout: Duration) -> Result<Self, ToolError> {
        let ffmpeg_path = ffmpeg_path.into();
        validate_tool_path(&ffmpeg_path)?;
        Ok(Self {
            ffmpeg_path,
            timeout,
        })
    }
}

#[async_trait]
impl Remuxer for FfmpegRemuxer {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "faststart"
    ))]
    async fn remux(&self, input: &Path) -> Result<PathBuf, RemuxError> {
        let start = std::time::Instant::now();
        let output_path = processed_path(input);

        let args: Vec<&OsStr> = vec![
            OsStr::new("-i"),
            input.as_os_str(),
            OsStr::new("-c"),
            OsStr::new("copy"),
            OsStr::new("-movflags"),
            OsStr::new("faststart"),
            OsStr::new("-f"),
            OsStr::new("mp4"),
            output_path.as_os_str(),
        ];

        let output = run_tool(&self.ffmpeg_path, args, self.timeout).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(status = %output.status, stderr = %stderr, "ffmpeg remux failed");
            return Err(RemuxError::Failed {
                status: output.status.to_string(),
                stderr,
            });
        }

        if !tokio::fs::try_exists(&output_path).await.unwrap_or(false) {
            return Err(RemuxError::MissingOutput(output_path));
        }

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            output = %output_path.display(),
            "Fast-start remux completed"
        );

        Ok(output_path)
    }
}
