use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::watch;
use tokio::time::{Duration, sleep};

/// Deletes staging leftovers from failed requests once they reach `max_age`.
pub struct StagingSweeper {
    root: PathBuf,
    max_age: Duration,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl StagingSweeper {
    pub fn new(
        root: PathBuf,
        max_age: Duration,
        interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            root,
            max_age,
            interval,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(
            "🧹 Staging sweeper started (max age {:?}, every {:?})",
            self.max_age,
            self.interval
        );

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    tracing::info!("🛑 Staging sweeper shutting down");
                    break;
                }
                _ = sleep(self.interval) => {
                    match sweep(&self.root, self.max_age).await {
                        Ok(0) => {}
                        Ok(removed) => tracing::info!("🧹 Removed {} stale staging entries", removed),
                        Err(e) => tracing::error!("Staging sweep failed: {:#}", e),
                    }
                }
            }
        }
    }
}

/// One pass over `root`: removes regular files older than `max_age` and
/// group directories that are empty and older than `max_age`. Returns how
/// many entries were removed.
pub async fn sweep(root: &Path, max_age: Duration) -> Result<usize> {
    let mut removed = 0;
    let mut entries = match fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let metadata = entry.metadata().await?;
        let age = metadata
            .modified()
            .ok()
            .and_then(|m| m.elapsed().ok())
            .unwrap_or_default();

        if age < max_age {
            continue;
        }

        if metadata.is_file() {
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
            }
        } else if metadata.is_dir() {
            // remove_dir only succeeds on empty directories
            if fs::remove_dir(&path).await.is_ok() {
                removed += 1;
            }
        }
    }

    Ok(removed)
}
