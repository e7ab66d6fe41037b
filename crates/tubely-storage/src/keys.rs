//! Object key generation.
//!
//! Key format: `{prefix}/{random_segment}.{extension}`. The random segment is
//! [`KEY_ENTROPY_BYTES`] bytes from a [`RandomSource`], encoded URL-safe base64
//! without padding (43 characters from `[A-Za-z0-9_-]`).

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::rngs::OsRng;
use rand::TryRngCore;
use std::fmt::{Display, Formatter, Result as FmtResult};
use thiserror::Error;
use tubely_core::constants::KEY_ENTROPY_BYTES;

/// The secure random source could not produce bytes
#[derive(Debug, Error)]
#[error("Secure random source unavailable: {0}")]
pub struct EntropyError(pub String);

/// Source of cryptographically secure random bytes
pub trait RandomSource: Send + Sync {
    fn secure_random_bytes(&self, len: usize) -> Result<Vec<u8>, EntropyError>;
}

/// Operating system CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn secure_random_bytes(&self, len: usize) -> Result<Vec<u8>, EntropyError> {
        let mut buf = vec![0u8; len];
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|e| EntropyError(e.to_string()))?;
        Ok(buf)
    }
}

/// Draw a fresh random segment for an object key.
pub fn random_segment(random: &dyn RandomSource) -> Result<String, EntropyError> {
    let bytes = random.secure_random_bytes(KEY_ENTROPY_BYTES)?;
    if bytes.len() < KEY_ENTROPY_BYTES {
        return Err(EntropyError(format!(
            "expected {} random bytes, got {}",
            KEY_ENTROPY_BYTES,
            bytes.len()
        )));
    }
    Ok(URL_SAFE_NO_PAD
        .encode(bytes)
        .chars()
        .filter(|c| *c != '/' && *c != '\\')
        .collect())
}

/// File extension for a content type: its subtype, without parameters.
///
/// `video/mp4` gives `mp4`, `image/png; q=1` gives `png`. Falls back to `bin`
/// when the subtype is missing or not alphanumeric.
pub fn extension_for(content_type: &str) -> String {
    let mime = content_type.split(';').next().unwrap_or("").trim();
    match mime.split_once('/') {
        Some((_, subtype))
            if !subtype.is_empty() && subtype.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            subtype.to_ascii_lowercase()
        }
        _ => "bin".to_string(),
    }
}

/// Storage key for one processed video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKey {
    prefix: String,
    random_segment: String,
    extension: String,
}

impl ObjectKey {
    /// Build a key under `prefix` for an object of `content_type`.
    ///
    /// Fails only when the random source does.
    pub fn generate(
        prefix: &str,
        content_type: &str,
        random: &dyn RandomSource,
    ) -> Result<Self, EntropyError> {
        Ok(Self {
            prefix: prefix.trim_matches('/').to_string(),
            random_segment: random_segment(random)?,
            extension: extension_for(content_type),
        })
    }

    pub fn random_segment(&self) -> &str {
        &self.random_segment
    }
}

impl Display for ObjectKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{}/{}.{}",
            self.prefix, self.random_segment, self.extension
        )
    }
}
