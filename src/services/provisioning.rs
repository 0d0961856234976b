use crate::config::{BUCKET_REGION, MULTIPLE_IMAGE_BUCKET, ProvisioningPolicy, SINGLE_IMAGE_BUCKET};
use crate::services::storage::ObjectStore;
use anyhow::{Context, Result};
use tracing::{error, info};

/// Buckets that must exist before uploads are accepted
pub const REQUIRED_BUCKETS: [&str; 2] = [SINGLE_IMAGE_BUCKET, MULTIPLE_IMAGE_BUCKET];

/// Checks each bucket and creates the missing ones. Stops at the first error.
pub async fn ensure_buckets_exist(store: &dyn ObjectStore, buckets: &[&str]) -> Result<()> {
    for bucket in buckets {
        let exists = store
            .bucket_exists(bucket)
            .await
            .with_context(|| format!("Failed to check bucket '{}'", bucket))?;

        if exists {
            info!("🪣 Bucket '{}' already exists", bucket);
            continue;
        }

        store
            .create_bucket(bucket, BUCKET_REGION)
            .await
            .with_context(|| format!("Failed to create bucket '{}'", bucket))?;
        info!("✅ Bucket '{}' created successfully", bucket);
    }

    Ok(())
}

/// Startup provisioning of [`REQUIRED_BUCKETS`] under the given policy.
///
/// With [`ProvisioningPolicy::BestEffort`] failures are logged and `Ok(())` is
/// returned so the server still comes up; uploads will then fail at the store.
pub async fn provision_buckets(store: &dyn ObjectStore, policy: ProvisioningPolicy) -> Result<()> {
    match ensure_buckets_exist(store, &REQUIRED_BUCKETS).await {
        Ok(()) => Ok(()),
        Err(e) => match policy {
            ProvisioningPolicy::BestEffort => {
                error!("❌ Error ensuring buckets exist: {:#}", e);
                Ok(())
            }
            ProvisioningPolicy::FailFast => Err(e),
        },
    }
}
