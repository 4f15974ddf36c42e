//! Lifecycle of export files between a scrape and its download.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mapharvest_export::{cleanup_stale_exports, is_generated_export};

/// Grace period between the end of a download stream and file removal.
pub const DOWNLOAD_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct ExportStore {
    dir: PathBuf,
    ttl: Duration,
    download_grace: Duration,
}

impl ExportStore {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
            download_grace: DOWNLOAD_GRACE,
        }
    }

    #[cfg(test)]
    #[must_use]
    pub fn with_download_grace(mut self, grace: Duration) -> Self {
        self.download_grace = grace;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the export directory if needed.
    pub async fn prepare(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Path for `filename` inside the store, or `None` if the name is not one
    /// this service generates.
    pub fn resolve(&self, filename: &str) -> Option<PathBuf> {
        is_generated_export(filename).then(|| self.dir.join(filename))
    }

    /// Removes every leftover export from a previous run.
    pub async fn cleanup_stale(&self) {
        let dir = self.dir.clone();
        match tokio::task::spawn_blocking(move || cleanup_stale_exports(&dir)).await {
            Ok(Ok(removed)) if removed > 0 => {
                tracing::info!(removed, dir = %self.dir.display(), "cleaned up stale exports");
            }
            Ok(Ok(_)) => {}
            Ok(Err(err)) => {
                tracing::warn!(error = %err, dir = %self.dir.display(), "stale export cleanup failed");
            }
            Err(err) => tracing::error!(error = %err, "stale export cleanup task panicked"),
        }
    }

    /// Schedules removal of a fresh export in case it is never downloaded.
    pub fn expire_later(&self, path: PathBuf) {
        remove_after(path, self.ttl, "expired undownloaded export");
    }

    /// Schedules removal of an export whose download has finished.
    pub fn release_after_download(&self, path: PathBuf) {
        remove_after(path, self.download_grace, "removed downloaded export");
    }
}

fn remove_after(path: PathBuf, delay: Duration, reason: &'static str) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::info!(file = %path.display(), "{reason}"),
            // Already removed by the other cleanup path.
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => tracing::warn!(file = %path.display(), error = %err, "failed to remove export"),
        }
    });
}
