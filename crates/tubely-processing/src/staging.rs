//! Temp staging of inbound upload streams.
//!
//! External tools need a seekable, named file. [`TempStager`] drains a byte
//! stream into a fresh scratch file and hands ownership of it to the caller.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Upload exceeds the limit of {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    #[error("Failed to stage upload: {0}")]
    Io(#[from] io::Error),
}

/// A fully written, closed scratch file. Removed when dropped.
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
    byte_length: u64,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn byte_length(&self) -> u64 {
        self.byte_length
    }

    /// Delete the file now, surfacing any error instead of ignoring it on drop
    pub fn remove(self) -> io::Result<()> {
        self.path.close()
    }
}

/// Writes upload streams to uniquely named files in a scratch directory
#[derive(Debug, Clone)]
pub struct TempStager {
    dir: PathBuf,
    prefix: String,
}

impl TempStager {
    /// `dir = None` stages into the system temp directory
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self {
            dir: dir.unwrap_or_else(std::env::temp_dir),
            prefix: "tubely-video".to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Drain `reader` into a new scratch file of at most `byte_limit` bytes.
    ///
    /// The file is flushed, synced and closed before this returns. On any
    /// error the partial file is removed before the error is returned.
    pub async fn stage<R>(&self, reader: R, byte_limit: u64) -> Result<StagedFile, StagingError>
    where
        R: AsyncRead + Unpin,
    {
        let named = tempfile::Builder::new()
            .prefix(&self.prefix)
            .tempfile_in(&self.dir)?;
        let (std_file, path) = named.into_parts();
        let mut file = tokio::fs::File::from_std(std_file);

        // Read one byte past the limit so an overrun is observable
        let mut limited = reader.take(byte_limit.saturating_add(1));
        let byte_length = tokio::io::copy(&mut limited, &mut file).await?;
        if byte_length > byte_limit {
            return Err(StagingError::PayloadTooLarge { limit: byte_limit });
        }

        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tracing::debug!(
            path = %path.display(),
            byte_length,
            "Upload staged to scratch file"
        );

        Ok(StagedFile { path, byte_length })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_stage_writes_full_stream() {
        let dir = tempdir().unwrap();
        let stager = TempStager::new(Some(dir.path().to_path_buf()));

        let staged = stager
            .stage(Cursor::new(b"ftypisom-bytes".to_vec()), 1024)
            .await
            .unwrap();

        assert_eq!(staged.byte_length(), 14);
        assert!(staged.path().starts_with(dir.path()));
        let name = staged.path().file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("tubely-video"));
        assert_eq!(std::fs::read(staged.path()).unwrap(), b"ftypisom-bytes");
    }

    #[tokio::test]
    async fn test_stage_accepts_exact_limit() {
        let dir = tempdir().unwrap();
        let stager = TempStager::new(Some(dir.path().to_path_buf()));
        let staged = stager.stage(Cursor::new(vec![7u8; 64]), 64).await.unwrap();
        assert_eq!(staged.byte_length(), 64);
    }

    #[tokio::test]
    async fn test_stage_over_limit_leaves_nothing_behind() {
        let dir = tempdir().unwrap();
        let stager = TempStager::new(Some(dir.path().to_path_buf()));

        let result = stager.stage(Cursor::new(vec![0u8; 65]), 64).await;

        assert!(matches!(
            result,
            Err(StagingError::PayloadTooLarge { limit: 64 })
        ));
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_aborted_stream_is_io_error() {
        let dir = tempdir().unwrap();
        let stager = TempStager::new(Some(dir.path().to_path_buf()));
        let reader = disconnecting_reader();

        let result = stager.stage(reader, 1024).await;

        assert!(matches!(result, Err(StagingError::Io(_))));
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_drop_and_remove_delete_file() {
        let dir = tempdir().unwrap();
        let stager = TempStager::new(Some(dir.path().to_path_buf()));

        let dropped = stager.stage(Cursor::new(b"a".to_vec()), 8).await.unwrap();
        drop(dropped);
        assert_eq!(entries(dir.path()), 0);

        let removed = stager.stage(Cursor::new(b"b".to_vec()), 8).await.unwrap();
        removed.remove().unwrap();
        assert_eq!(entries(dir.path()), 0);
    }

    /// Yields a few bytes, then fails like a client disconnect mid-upload
    fn disconnecting_reader() -> impl AsyncRead + Unpin {
        let head = Cursor::new(b"partial".to_vec());
        let tail = FailingReader;
        head.chain(tail)
    }

    struct FailingReader;

    impl AsyncRead for FailingReader {
        fn poll_read(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &mut tokio::io::ReadBuf<'_>,
        ) -> std::task::Poll<io::Result<()>> {
            std::task::Poll::Ready(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "client went away",
            )))
        }
    }
}
