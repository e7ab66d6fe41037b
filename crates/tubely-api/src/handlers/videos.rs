use crate::auth::AuthUser;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tubely_core::models::{CreateVideoRequest, Video, VideoResponse};
use tubely_core::AppError;
use uuid::Uuid;

/// Parse a path id and load the record, rejecting callers who don't own it
pub(crate) async fn load_owned_video(
    state: &AppState,
    raw_id: &str,
    user: AuthUser,
) -> Result<Video, AppError> {
    let video_id = Uuid::parse_str(raw_id)?;
    let video = state.videos.get_video(video_id).await?;
    if !video.is_owned_by(user.user_id) {
        tracing::debug!(
            video_id = %video_id,
            user_id = %user.user_id,
            "Rejected access to another user's video"
        );
        return Err(AppError::Unauthorized(
            "You don't own this video".to_string(),
        ));
    }
    Ok(video)
}

pub async fn create_video(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateVideoRequest>,
) -> Result<(StatusCode, Json<VideoResponse>), HttpAppError> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidInput("Title must not be empty".to_string()).into());
    }

    let video = Video::new(user.user_id, title.to_string(), request.description);
    let video = state.videos.create_video(video).await?;

    tracing::info!(video_id = %video.id, user_id = %user.user_id, "Video draft created");

    Ok((StatusCode::CREATED, Json(video.into())))
}

pub async fn get_video(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(video_id): Path<String>,
) -> Result<Json<VideoResponse>, HttpAppError> {
    let video = load_owned_video(&state, &video_id, user).await?;
    Ok(Json(video.into()))
}
