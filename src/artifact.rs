//! Audit artifact persistence behind a trait, with a filesystem
//! implementation for the pre-/post-commit wager screenshots.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::TrackingId;
use crate::error::Result;

/// Write-only store for audit artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;
}

/// Key for a wager audit image, correlating provider, tracking id, commit
/// stage, and capture time.
#[must_use]
pub fn audit_key(provider: &str, tracking_id: &TrackingId, stage: &str) -> String {
    let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%SZ");
    format!("{provider}_{tracking_id}_{stage}_{stamp}.png")
}

/// Filesystem-backed artifact store writing into one directory.
pub struct FsArtifactStore {
    dir: PathBuf,
}

impl FsArtifactStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(key), bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_artifact_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path().join("audit"));
        store.put("bookline_t1_pre.png", b"png-bytes").await.unwrap();

        let written = std::fs::read(dir.path().join("audit/bookline_t1_pre.png")).unwrap();
        assert_eq!(written, b"png-bytes");
    }

    #[test]
    fn audit_key_carries_provider_and_stage() {
        let key = audit_key("bookline", &TrackingId::from("t-9"), "pre");
        assert!(key.starts_with("bookline_t-9_pre_"));
        assert!(key.ends_with(".png"));
    }
}
