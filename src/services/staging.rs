use crate::utils::naming::{extension_of, generate_id, local_component};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};

/// A file written to the staging directory, owned by the request that
/// received it.
#[derive(Debug)]
pub struct StagedFile {
    /// Id assigned at intake; the default base name for the stored object
    pub id: String,
    /// Filename as sent by the client
    pub original_name: String,
    pub path: PathBuf,
    pub size: u64,
}

impl StagedFile {
    pub fn extension(&self) -> &str {
        extension_of(&self.original_name)
    }
}

/// Process-wide local directory holding uploads until they reach the store.
///
/// There is no locking: two requests asking for the same name overwrite each
/// other's staging file, the last rename wins.
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create staging dir {}", self.root.display()))
    }

    /// Writes `reader` to `{id}{ext}` in the staging directory.
    pub async fn stage<R>(&self, original_name: &str, mut reader: R) -> Result<StagedFile>
    where
        R: AsyncRead + Unpin + Send,
    {
        self.ensure_root().await?;

        let id = generate_id();
        let local_name = local_component(&format!("{}{}", id, extension_of(original_name)));
        let path = self.root.join(local_name);

        let mut file = fs::File::create(&path)
            .await
            .with_context(|| format!("Failed to create staging file {}", path.display()))?;

        let copied = tokio::io::copy(&mut reader, &mut file).await;
        let size = match copied {
            Ok(size) => size,
            Err(e) => {
                drop(file);
                let _ = fs::remove_file(&path).await;
                return Err(anyhow::Error::new(e).context("Failed to write staging file"));
            }
        };
        file.flush().await?;

        tracing::debug!("Staged {} ({} bytes) at {}", original_name, size, path.display());

        Ok(StagedFile {
            id,
            original_name: original_name.to_string(),
            path,
            size,
        })
    }

    /// Moves a staged file to `name`, replacing whatever is already there.
    pub async fn rename(&self, mut staged: StagedFile, name: &str) -> Result<StagedFile> {
        let target = self.root.join(local_component(name));
        if target != staged.path {
            fs::rename(&staged.path, &target).await.with_context(|| {
                format!(
                    "Failed to rename staging file {} to {}",
                    staged.path.display(),
                    target.display()
                )
            })?;
            staged.path = target;
        }
        Ok(staged)
    }

    /// Creates the `{group_id}` subdirectory. Nothing is read from it; it only
    /// marks the group inside the staging area.
    pub async fn create_group_dir(&self, group_id: &str) -> Result<PathBuf> {
        let dir = self.root.join(local_component(group_id));
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create group dir {}", dir.display()))?;
        Ok(dir)
    }

    pub async fn remove(&self, staged: &StagedFile) -> Result<()> {
        fs::remove_file(&staged.path)
            .await
            .with_context(|| format!("Failed to delete staging file {}", staged.path.display()))
    }

    /// Removes files that never reached a handler, logging instead of failing.
    pub async fn discard(&self, files: Vec<StagedFile>) {
        for staged in files {
            if let Err(e) = self.remove(&staged).await {
                tracing::warn!("{:#}", e);
            }
        }
    }
}
