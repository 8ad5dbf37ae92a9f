//! 🗄️ Local filesystem store — a distributed store that happens to live on one disk.
//!
//! Remote paths like `/tmp/elasticsearch/plugins` are rooted under a local
//! directory, so "upload" means "copy over there" and "ship" means "confirm it's
//! over there and hand back a ticket". Good enough for a single box, for tests,
//! and for anyone whose cluster is, spiritually, one laptop.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::backends::DistributedStore;
use crate::job_context::{ArtifactKind, ShippedArtifact};

#[derive(Debug, Clone)]
pub struct LocalFsStore {
    root: PathBuf,
}

impl LocalFsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 📍 Where a remote path actually lands on disk. Leading slashes are ignored,
    /// so `/tmp/x` and `tmp/x` both live at `<root>/tmp/x`.
    pub fn local_path_of(&self, remote_path: &str) -> PathBuf {
        self.root.join(remote_path.trim_start_matches('/'))
    }

    async fn ship(&self, remote_path: &str, kind: ArtifactKind) -> Result<ShippedArtifact> {
        let landed = self.local_path_of(remote_path);
        let exists = fs::try_exists(&landed)
            .await
            .with_context(|| format!("💀 Could not check whether '{}' exists", landed.display()))?;
        if !exists {
            bail!("💀 Cannot ship '{remote_path}': it was never uploaded to the store");
        }
        Ok(ShippedArtifact {
            remote_path: remote_path.to_string(),
            kind,
        })
    }
}

#[async_trait]
impl DistributedStore for LocalFsStore {
    async fn upload(&self, local_path: &Path, remote_path: &str) -> Result<()> {
        let target = self.local_path_of(remote_path);
        let metadata = fs::metadata(local_path).await.with_context(|| {
            format!(
                "💀 Local artifact '{}' is not there. We looked under the couch. Nothing.",
                local_path.display()
            )
        })?;

        debug!("📤 uploading '{}' to '{}'", local_path.display(), target.display());
        if metadata.is_dir() {
            copy_dir_tree(local_path, &target).await
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("💀 Failed to create '{}'", parent.display()))?;
            }
            fs::copy(local_path, &target).await.with_context(|| {
                format!("💀 Failed to copy '{}' to '{}'", local_path.display(), target.display())
            })?;
            Ok(())
        }
    }

    async fn ship_file(&self, remote_path: &str) -> Result<ShippedArtifact> {
        self.ship(remote_path, ArtifactKind::File).await
    }

    async fn ship_archive(&self, remote_path: &str) -> Result<ShippedArtifact> {
        self.ship(remote_path, ArtifactKind::Archive).await
    }
}

// 🔄 Iterative, not recursive: async recursion needs boxing and nobody wants that.
async fn copy_dir_tree(from: &Path, to: &Path) -> Result<()> {
    let mut pending = vec![(from.to_path_buf(), to.to_path_buf())];
    while let Some((source_dir, target_dir)) = pending.pop() {
        fs::create_dir_all(&target_dir)
            .await
            .with_context(|| format!("💀 Failed to create '{}'", target_dir.display()))?;
        let mut entries = fs::read_dir(&source_dir)
            .await
            .with_context(|| format!("💀 Failed to list '{}'", source_dir.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            let destination = target_dir.join(entry.file_name());
            if entry.file_type().await?.is_dir() {
                pending.push((entry.path(), destination));
            } else {
                fs::copy(entry.path(), &destination).await.with_context(|| {
                    format!("💀 Failed to copy '{}'", entry.path().display())
                })?;
            }
        }
    }
    Ok(())
}
