use crate::auth::AuthUser;
use crate::error::HttpAppError;
use crate::handlers::videos::load_owned_video;
use crate::state::AppState;
use crate::utils::upload::{
    field_content_type, field_reader, missing_field, next_field, validate_content_type,
};
use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use std::sync::Arc;
use tubely_core::constants::VIDEO_FORM_FIELD;
use tubely_core::models::VideoResponse;
use tubely_processing::UploadRequest;

/// Upload the video body for an existing record.
///
/// The `video` form field is streamed through the ingest pipeline (stage,
/// fast-start remux, probe, classify, store) and the record's `video_url` is
/// set to the stored object's URL. On any failure the record is untouched.
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(video_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<VideoResponse>, HttpAppError> {
    let mut video = load_owned_video(&state, &video_id, user).await?;

    let field = loop {
        match next_field(&mut multipart).await? {
            Some(field) if field.name() == Some(VIDEO_FORM_FIELD) => break field,
            Some(_) => continue,
            None => return Err(missing_field(VIDEO_FORM_FIELD).into()),
        }
    };

    let content_type = field_content_type(&field)?;
    validate_content_type(&content_type, state.config.video_allowed_content_types())?;

    tracing::info!(
        video_id = %video.id,
        user_id = %user.user_id,
        content_type = %content_type,
        "Uploading video"
    );

    let ingested = state
        .pipeline
        .ingest(UploadRequest {
            owner_id: user.user_id,
            video_id: video.id,
            content_type,
            reader: field_reader(field),
            byte_limit: state.config.max_video_size_bytes() as u64,
        })
        .await?;

    video.video_url = Some(ingested.url);
    let video = state.videos.update_video(video).await?;

    Ok(Json(video.into()))
}
