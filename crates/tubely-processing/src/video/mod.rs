//! Video inspection and remuxing

mod aspect;
mod probe;
mod remux;

pub use aspect::{classify, AspectClass};
pub use probe::{parse_geometry, FfprobeProber, MetadataProber, ProbeError};
pub use remux::{processed_path, FfmpegRemuxer, RemuxError, Remuxer};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::run_tool;
    use std::ffi::OsString;
    use std::time::Duration;
    use tempfile::tempdir;

    #[tokio::test]
    #[ignore = "requires ffmpeg and ffprobe on PATH"]
    async fn test_remux_then_probe_real_tools() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("tubely-video-sample");
        let timeout = Duration::from_secs(60);

        let mut args: Vec<OsString> = [
            "-f",
            "lavfi",
            "-i",
            "testsrc=size=1280x720:duration=1",
            "-pix_fmt",
            "yuv420p",
            "-f",
            "mp4",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(input.clone().into_os_string());

        let generated = run_tool("ffmpeg", args, timeout).await.unwrap();
        assert!(generated.status.success());

        let remuxer = FfmpegRemuxer::new("ffmpeg", timeout).unwrap();
        let processed = remuxer.remux(&input).await.unwrap();
        assert_eq!(processed, processed_path(&input));
        assert!(input.exists());

        let prober = FfprobeProber::new("ffprobe", timeout).unwrap();
        let geometry = prober.probe(&processed).await.unwrap();
        assert_eq!((geometry.width(), geometry.height()), (1280, 720));
        assert_eq!(geometry.aspect_class(), AspectClass::Landscape);
    }
}
