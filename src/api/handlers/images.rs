use crate::AppState;
use crate::api::error::GatewayError;
use crate::services::upload_service::StoredFile;
use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct ImageListResponse {
    pub message: String,
    pub files: Vec<StoredFile>,
}

#[derive(Serialize, ToSchema)]
pub struct DownloadResponse {
    pub message: String,
    pub url: String,
}

#[utoipa::path(
    get,
    path = "/get-images/{folder}",
    params(
        ("folder" = String, Path, description = "Group id")
    ),
    responses(
        (status = 200, description = "Presigned URLs for every image in the group", body = ImageListResponse),
        (status = 500, description = "Listing failed")
    ),
    tag = "images"
)]
pub async fn get_images(
    State(state): State<AppState>,
    Path(folder): Path<String>,
) -> Result<Json<ImageListResponse>, GatewayError> {
    let files = state
        .uploads
        .list_group(&folder)
        .await
        .map_err(GatewayError::upstream("Error retrieving images"))?;

    Ok(Json(ImageListResponse {
        message: "Successfully retrieved all images in the folder".to_string(),
        files,
    }))
}

#[utoipa::path(
    get,
    path = "/download/{filename}",
    params(
        ("filename" = String, Path, description = "Object key in the single-image bucket")
    ),
    responses(
        (status = 200, description = "Presigned URL, valid for one hour", body = DownloadResponse),
        (status = 500, description = "URL generation failed")
    ),
    tag = "images"
)]
pub async fn download_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<DownloadResponse>, GatewayError> {
    let url = state
        .uploads
        .download_url(&filename)
        .await
        .map_err(GatewayError::upstream("Error generating presigned URL"))?;

    Ok(Json(DownloadResponse {
        message: "Presigned URL generated successfully".to_string(),
        url,
    }))
}
