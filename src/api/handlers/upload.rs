use crate::AppState;
use crate::api::error::GatewayError;
use crate::config::{MAX_FILES_PER_GROUP, MULTIPLE_IMAGE_BUCKET, SINGLE_IMAGE_BUCKET};
use crate::services::intake::receive_upload;
use crate::services::upload_service::StoredFile;
use axum::{
    Json,
    extract::{Multipart, State},
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    /// Object key in the single-image bucket
    pub filename: String,
}

#[derive(Serialize, ToSchema)]
pub struct GroupUploadResponse {
    pub message: String,
    /// Group id, the key prefix of every stored file
    pub folder: String,
    pub files: Vec<StoredFile>,
}

/// `multipart/form-data` body of `POST /upload`
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct SingleUploadForm {
    #[schema(value_type = String, format = Binary)]
    image: Vec<u8>,
    /// Stored name without extension
    filename: Option<String>,
}

/// `multipart/form-data` body of `POST /upload-multiple`. Per-file names go in
/// `filename1`, `filename2`, ... (1-based).
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct GroupUploadForm {
    #[schema(value_type = Vec<String>, format = Binary)]
    images: Vec<Vec<u8>>,
    /// Group id
    filename: Option<String>,
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = SingleUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "No file uploaded"),
        (status = 500, description = "Object store error")
    ),
    tag = "images"
)]
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, GatewayError> {
    let mut form = receive_upload(&mut multipart, state.uploads.staging(), "image", 1).await?;

    let staged = form
        .files
        .pop()
        .ok_or_else(|| GatewayError::BadRequest("No file uploaded".to_string()))?;

    let filename = state
        .uploads
        .store_single(staged, form.text("filename"))
        .await
        .map_err(GatewayError::upstream("Error uploading file to object store"))?;

    Ok(Json(UploadResponse {
        message: format!("Image uploaded successfully to {}", SINGLE_IMAGE_BUCKET),
        filename,
    }))
}

#[utoipa::path(
    post,
    path = "/upload-multiple",
    request_body(content = GroupUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Images stored", body = GroupUploadResponse),
        (status = 400, description = "No files uploaded or more than 10 files"),
        (status = 500, description = "Object store error; earlier files may already be stored")
    ),
    tag = "images"
)]
pub async fn upload_images(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<GroupUploadResponse>, GatewayError> {
    let mut form = receive_upload(
        &mut multipart,
        state.uploads.staging(),
        "images",
        MAX_FILES_PER_GROUP,
    )
    .await?;

    if form.files.is_empty() {
        return Err(GatewayError::BadRequest("No files uploaded".to_string()));
    }

    let files = std::mem::take(&mut form.files);
    let requested_names: Vec<Option<String>> = (1..=files.len())
        .map(|i| form.text(&format!("filename{}", i)).map(str::to_string))
        .collect();

    let group = state
        .uploads
        .store_group(files, form.text("filename"), &requested_names)
        .await
        .map_err(GatewayError::upstream("Error uploading files to object store"))?;

    Ok(Json(GroupUploadResponse {
        message: format!("Images uploaded successfully to {}", MULTIPLE_IMAGE_BUCKET),
        folder: group.folder,
        files: group.files,
    }))
}
