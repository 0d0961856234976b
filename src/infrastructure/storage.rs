use crate::config::{BUCKET_REGION, GatewayConfig};
use crate::services::storage::S3ObjectStore;
use aws_sdk_s3::config::Region;
use std::sync::Arc;
use tracing::info;

pub async fn setup_storage(config: &GatewayConfig) -> Arc<S3ObjectStore> {
    let endpoint_url = config.store_endpoint_url();

    info!("☁️  Object store: {}", endpoint_url);

    let aws_config = aws_config::from_env()
        .endpoint_url(&endpoint_url)
        .region(Region::new(BUCKET_REGION))
        .credentials_provider(aws_sdk_s3::config::Credentials::new(
            config.store_access_key.clone(),
            config.store_secret_key.clone(),
            None,
            None,
            "static",
        ))
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(true)
        .build();

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);
    Arc::new(S3ObjectStore::new(s3_client))
}
