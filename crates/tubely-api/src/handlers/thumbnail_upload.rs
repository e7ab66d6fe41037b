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
use tubely_core::constants::THUMBNAIL_FORM_FIELD;
use tubely_core::models::VideoResponse;
use tubely_storage::{extension_for, random_segment};

/// Upload a thumbnail image for an existing record.
///
/// Stored in the assets directory as `{random}.{ext}` and linked from the
/// record's `thumbnail_url`.
pub async fn upload_thumbnail(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(video_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<VideoResponse>, HttpAppError> {
    let mut video = load_owned_video(&state, &video_id, user).await?;

    let field = loop {
        match next_field(&mut multipart).await? {
            Some(field) if field.name() == Some(THUMBNAIL_FORM_FIELD) => break field,
            Some(_) => continue,
            None => return Err(missing_field(THUMBNAIL_FORM_FIELD).into()),
        }
    };

    let content_type = field_content_type(&field)?;
    validate_content_type(&content_type, state.config.thumbnail_allowed_content_types())?;

    let store = &state.thumbnails;
    let staged = store
        .stager
        .stage(
            field_reader(field),
            state.config.max_thumbnail_size_bytes() as u64,
        )
        .await?;

    let key = format!(
        "{}.{}",
        random_segment(store.random.as_ref())?,
        extension_for(&content_type)
    );
    let url = store
        .storage
        .put_file(&key, staged.path(), &content_type, staged.byte_length())
        .await?;

    if let Err(e) = staged.remove() {
        tracing::warn!(error = %e, "Failed to remove staged thumbnail");
    }

    tracing::info!(
        video_id = %video.id,
        key = %key,
        "Thumbnail stored"
    );

    video.thumbnail_url = Some(url);
    let video = state.videos.update_video(video).await?;

    Ok(Json(video.into()))
}
