//! Tubely Processing Library
//!
//! The video ingestion pipeline and its steps: staging an upload to a scratch
//! file, fast-start remuxing with ffmpeg, probing geometry with ffprobe,
//! aspect classification, and handing the result to object storage.

pub mod command;
pub mod metadata;
pub mod pipeline;
pub mod staging;
pub mod video;

pub use command::ToolError;
pub use metadata::MediaGeometry;
pub use pipeline::{IngestPipeline, IngestedVideo, PipelineError, PipelineState, UploadRequest};
pub use staging::{StagedFile, StagingError, TempStager};
pub use video::{
    classify, processed_path, AspectClass, FfmpegRemuxer, FfprobeProber, MetadataProber,
    ProbeError, RemuxError, Remuxer,
};
