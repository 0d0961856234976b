pub mod api;
pub mod config;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::GatewayConfig;
use crate::services::staging::StagingArea;
use crate::services::storage::ObjectStore;
use crate::services::upload_service::UploadService;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::upload::upload_image,
        api::handlers::upload::upload_images,
        api::handlers::images::get_images,
        api::handlers::images::download_image,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::upload::UploadResponse,
            api::handlers::upload::GroupUploadResponse,
            api::handlers::upload::SingleUploadForm,
            api::handlers::upload::GroupUploadForm,
            api::handlers::images::ImageListResponse,
            api::handlers::images::DownloadResponse,
            api::handlers::health::HealthResponse,
            services::upload_service::StoredFile,
        )
    ),
    tags(
        (name = "images", description = "Image upload and download links"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    pub uploads: Arc<UploadService>,
    pub config: GatewayConfig,
}

impl AppState {
    /// Builds the shared state around an already-constructed store client.
    pub fn new(store: Arc<dyn ObjectStore>, config: GatewayConfig) -> Self {
        let staging = StagingArea::new(config.staging_dir.clone());
        let uploads = Arc::new(UploadService::new(store.clone(), staging));
        Self {
            store,
            uploads,
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/upload", post(api::handlers::upload::upload_image))
        .route("/upload-multiple", post(api::handlers::upload::upload_images))
        .route("/get-images/:folder", get(api::handlers::images::get_images))
        .route("/download/:filename", get(api::handlers::images::download_image))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .with_state(state)
}
