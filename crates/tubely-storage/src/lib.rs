//! Tubely Storage Library
//!
//! Object storage for processed videos and thumbnails: the [`Storage`] trait,
//! S3 and local filesystem backends, and object key generation.
//!
//! # Object key format
//!
//! Video keys are `{aspect_prefix}/{random_segment}.{extension}`, e.g.
//! `landscape/3q2-Wd....mp4`. The random segment is 256 bits of OS randomness
//! encoded with the URL-safe base64 alphabet, so keys never contain a path
//! separator and are never reused. See [`keys`].

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::{extension_for, random_segment, EntropyError, ObjectKey, OsRandom, RandomSource};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
pub use tubely_core::StorageBackend;
