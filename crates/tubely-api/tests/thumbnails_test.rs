mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use helpers::{setup_test_app, ASSETS_URL};
use tubely_db::VideoRepository;
use uuid::Uuid;

const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01,
];

fn thumbnail_form(mime: &str) -> MultipartForm {
    let part = Part::bytes(bytes::Bytes::from_static(PNG_BYTES))
        .file_name("thumb.png")
        .mime_type(mime);
    MultipartForm::new().add_part("thumbnail", part)
}

#[tokio::test]
async fn test_upload_thumbnail_is_served_from_assets() {
    let app = setup_test_app().await;
    let user_id = Uuid::new_v4();
    let video = app.seed_video(user_id).await;

    let response = app
        .client()
        .post(&format!("/api/videos/{}/thumbnail", video.id))
        .add_header("Authorization", format!("Bearer {}", app.token_for(user_id)))
        .multipart(thumbnail_form("image/png"))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    let url = body["thumbnail_url"].as_str().expect("thumbnail_url missing");
    let file_name = url
        .strip_prefix(&format!("{}/", ASSETS_URL))
        .expect("unexpected thumbnail url");
    assert!(file_name.ends_with(".png"));
    assert!(!file_name.contains('/'));

    let stored = app.asset_files();
    assert_eq!(stored.len(), 1);
    assert_eq!(std::fs::read(&stored[0]).unwrap(), PNG_BYTES);
    assert!(app.scratch_files().is_empty());

    let served = app
        .client()
        .get(&format!("/assets/{}", file_name))
        .await;
    assert_eq!(served.status_code(), 200);
    assert_eq!(served.as_bytes().as_ref(), PNG_BYTES);

    let record = app.videos.get_video(video.id).await.unwrap();
    assert_eq!(record.thumbnail_url.as_deref(), Some(url));
}

#[tokio::test]
async fn test_thumbnail_rejects_unsupported_image_type() {
    let app = setup_test_app().await;
    let user_id = Uuid::new_v4();
    let video = app.seed_video(user_id).await;

    let response = app
        .client()
        .post(&format!("/api/videos/{}/thumbnail", video.id))
        .add_header("Authorization", format!("Bearer {}", app.token_for(user_id)))
        .multipart(thumbnail_form("image/gif"))
        .await;

    assert_eq!(response.status_code(), 400);
    assert!(app.asset_files().is_empty());
}

#[tokio::test]
async fn test_thumbnail_for_another_users_video_is_unauthorized() {
    let app = setup_test_app().await;
    let video = app.seed_video(Uuid::new_v4()).await;

    let response = app
        .client()
        .post(&format!("/api/videos/{}/thumbnail", video.id))
        .add_header(
            "Authorization",
            format!("Bearer {}", app.token_for(Uuid::new_v4())),
        )
        .multipart(thumbnail_form("image/png"))
        .await;

    assert_eq!(response.status_code(), 401);
    assert!(app.asset_files().is_empty());
}
