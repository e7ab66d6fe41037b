//! Common utilities for file upload handlers

use axum::extract::multipart::{Field, Multipart, MultipartError};
use axum::http::StatusCode;
use futures::TryStreamExt;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;
use tubely_core::AppError;

fn multipart_app_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Request body too large".to_string())
    } else {
        AppError::InvalidInput(format!("Failed to read multipart: {}", err))
    }
}

/// Next multipart field, with read failures mapped to client errors
pub async fn next_field(multipart: &mut Multipart) -> Result<Option<Field<'_>>, AppError> {
    multipart.next_field().await.map_err(multipart_app_error)
}

/// Error for a form that ended without the expected file field
pub fn missing_field(name: &str) -> AppError {
    AppError::InvalidInput(format!(
        "Unable to parse form file: missing field '{}'",
        name
    ))
}

/// Declared content type of a file part
pub fn field_content_type(field: &Field<'_>) -> Result<String, AppError> {
    field
        .content_type()
        .map(|s| s.to_string())
        .ok_or_else(|| AppError::InvalidInput("Missing Content-Type for file".to_string()))
}

/// Adapt a multipart field into an `AsyncRead` over its body.
///
/// Read errors carry the original [`MultipartError`] so a body limit overrun
/// can still be told apart from a dropped connection.
pub fn field_reader<'a>(field: Field<'a>) -> impl AsyncRead + Unpin + Send + 'a {
    StreamReader::new(Box::pin(field.map_err(std::io::Error::other)))
}

/// Normalize MIME type by stripping parameters (e.g. "image/jpeg; charset=utf-8" -> "image/jpeg").
fn normalize_mime_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
}

/// Validate content type against allowlist. Compares normalized MIME type only (no parameter bypass).
pub fn validate_content_type(content_type: &str, allowed_types: &[String]) -> Result<(), AppError> {
    let normalized = normalize_mime_type(content_type).to_lowercase();
    if !allowed_types.iter().any(|ct| normalized == ct.to_lowercase()) {
        return Err(AppError::InvalidInput(format!(
            "Invalid content type. Allowed types: {}",
            allowed_types.join(", ")
        )));
    }
    Ok(())
}
