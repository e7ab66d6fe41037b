/// Upper bound for an uploaded video (1 GiB).
pub const MAX_VIDEO_SIZE_MB: usize = 1024;

/// Upper bound for an uploaded thumbnail image.
pub const MAX_THUMBNAIL_SIZE_MB: usize = 10;

/// Wall-clock budget for one ffprobe / ffmpeg invocation.
pub const PROCESS_TIMEOUT_SECS: u64 = 300;

/// Number of random bytes behind every object key segment (256 bits).
pub const KEY_ENTROPY_BYTES: usize = 32;

/// Suffix appended to a staged file path by the fast-start remux.
pub const PROCESSED_SUFFIX: &str = ".processed.mp4";

/// Multipart form field carrying the video body.
pub const VIDEO_FORM_FIELD: &str = "video";

/// Multipart form field carrying the thumbnail body.
pub const THUMBNAIL_FORM_FIELD: &str = "thumbnail";
