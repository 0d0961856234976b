use crate::config::{MULTIPLE_IMAGE_BUCKET, PRESIGNED_URL_TTL_SECS, SINGLE_IMAGE_BUCKET};
use crate::services::staging::{StagedFile, StagingArea};
use crate::services::storage::ObjectStore;
use crate::utils::naming::{
    generate_id, group_object_key, group_prefix, is_directory_marker, member_name,
    single_object_key,
};
use anyhow::{Context, Result};
use aws_sdk_s3::primitives::ByteStream;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use utoipa::ToSchema;

/// A stored object together with a presigned GET URL for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StoredFile {
    pub filename: String,
    pub url: String,
}

#[derive(Debug)]
pub struct GroupUpload {
    pub folder: String,
    pub files: Vec<StoredFile>,
}

fn presign_ttl() -> Duration {
    Duration::from_secs(PRESIGNED_URL_TTL_SECS)
}

/// Moves staged uploads into the object store and hands out download links.
pub struct UploadService {
    store: Arc<dyn ObjectStore>,
    staging: StagingArea,
}

impl UploadService {
    pub fn new(store: Arc<dyn ObjectStore>, staging: StagingArea) -> Self {
        Self { store, staging }
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    async fn put_staged(&self, bucket: &str, key: &str, staged: &StagedFile) -> Result<()> {
        let size = tokio::fs::metadata(&staged.path)
            .await
            .with_context(|| format!("Failed to stat staging file {}", staged.path.display()))?
            .len();
        let body = ByteStream::from_path(&staged.path)
            .await
            .with_context(|| format!("Failed to open staging file {}", staged.path.display()))?;

        self.store
            .put_object(bucket, key, body, size as i64)
            .await
            .with_context(|| format!("Failed to store {}/{}", bucket, key))
    }

    /// Stores one staged file in the single-image bucket and returns its key.
    ///
    /// The staging file is only deleted once the store accepted the object; on
    /// any earlier error it is left behind.
    pub async fn store_single(&self, staged: StagedFile, requested: Option<&str>) -> Result<String> {
        let key = single_object_key(requested, &staged.id, &staged.original_name);

        let staged = match requested {
            Some(_) => self.staging.rename(staged, &key).await?,
            None => staged,
        };

        self.put_staged(SINGLE_IMAGE_BUCKET, &key, &staged).await?;
        self.staging.remove(&staged).await?;

        tracing::info!("📦 Stored {} ({} bytes) in {}", key, staged.size, SINGLE_IMAGE_BUCKET);
        Ok(key)
    }

    /// Stores `files` under one group prefix, strictly in order.
    ///
    /// `requested_names[i]` overrides the member name of the (i+1)-th file. The
    /// first failure aborts the batch; members stored before it stay stored.
    pub async fn store_group(
        &self,
        files: Vec<StagedFile>,
        group_id: Option<&str>,
        requested_names: &[Option<String>],
    ) -> Result<GroupUpload> {
        let folder = group_id.map(str::to_string).unwrap_or_else(generate_id);
        self.staging.create_group_dir(&folder).await?;

        let mut stored = Vec::with_capacity(files.len());

        for (i, staged) in files.iter().enumerate() {
            let index = i + 1;
            let requested = requested_names.get(i).and_then(|n| n.as_deref());
            let member = member_name(index, requested, &staged.original_name);
            let key = group_object_key(&folder, &member);

            self.put_staged(MULTIPLE_IMAGE_BUCKET, &key, staged).await?;
            self.staging.remove(staged).await?;

            let url = self
                .store
                .presigned_get_url(MULTIPLE_IMAGE_BUCKET, &key, presign_ttl())
                .await
                .with_context(|| format!("Failed to presign {}", key))?;

            stored.push(StoredFile { filename: key, url });
        }

        tracing::info!(
            "📦 Stored {} file(s) in {} under '{}'",
            stored.len(),
            MULTIPLE_IMAGE_BUCKET,
            folder
        );

        Ok(GroupUpload {
            folder,
            files: stored,
        })
    }

    /// Lists a group and presigns every member concurrently.
    ///
    /// Members whose URL cannot be generated are logged and left out. The
    /// result is in completion order, not listing order.
    pub async fn list_group(&self, folder: &str) -> Result<Vec<StoredFile>> {
        let keys: Vec<String> = self
            .store
            .list_objects(MULTIPLE_IMAGE_BUCKET, &group_prefix(folder))
            .await
            .with_context(|| format!("Failed to list group '{}'", folder))?
            .into_iter()
            .filter(|key| !is_directory_marker(key))
            .collect();

        let (tx, mut rx) = mpsc::channel(keys.len().max(1));

        for key in keys {
            let store = self.store.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                match store
                    .presigned_get_url(MULTIPLE_IMAGE_BUCKET, &key, presign_ttl())
                    .await
                {
                    Ok(url) => {
                        let _ = tx.send(StoredFile { filename: key, url }).await;
                    }
                    Err(e) => {
                        tracing::error!("Error generating URL for {}: {:#}", key, e);
                    }
                }
            });
        }
        drop(tx);

        let mut files = Vec::new();
        while let Some(file) = rx.recv().await {
            files.push(file);
        }

        Ok(files)
    }

    /// Presigns `filename` in the single-image bucket. The key is not checked
    /// for existence.
    pub async fn download_url(&self, filename: &str) -> Result<String> {
        self.store
            .presigned_get_url(SINGLE_IMAGE_BUCKET, filename, presign_ttl())
            .await
            .with_context(|| format!("Failed to presign {}", filename))
    }
}
