use crate::fetch::RepoRef;
use crate::utils::{compute_tarball_digest, verify_tarball_digest};
use anyhow::{Context, Result as AnyhowResult};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tokio::fs;

/// A tarball read back from disk along with how long ago it was written.
#[derive(Debug)]
pub struct PersistedTarball {
    pub tar_bytes: Vec<u8>,
    pub age: Duration,
}

/// Best-effort persistence of fetched tarballs, so a restarted process can skip its first fetch.
///
/// Each snapshot is stored as `{dir}/{stem}.tar` with a `.sha256` sidecar, where the stem comes from
/// [`RepoRef::cache_stem`]. Nothing here
/// returns an error to the caller: failures are logged and treated as a cache miss.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `newsletter-cache` under the system temp directory.
    pub fn default_dir() -> PathBuf {
        std::env::temp_dir().join("newsletter-cache")
    }

    fn tar_path(&self, repo: &RepoRef) -> PathBuf {
        self.dir.join(format!("{}.tar", repo.cache_stem()))
    }

    fn digest_path(&self, repo: &RepoRef) -> PathBuf {
        self.dir.join(format!("{}.sha256", repo.cache_stem()))
    }

    /// Reads the stored tarball for `repo`, if one exists and matches its recorded digest.
    pub async fn load(&self, repo: &RepoRef) -> Option<PersistedTarball> {
        match self.try_load(repo).await {
            Ok(Some(persisted)) => {
                info!(
                    "Loaded cached tarball for {} from disk ({} bytes, {}s old)",
                    repo,
                    persisted.tar_bytes.len(),
                    persisted.age.as_secs()
                );
                Some(persisted)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Ignoring disk cache for {}: {:#}", repo, e);
                None
            }
        }
    }

    async fn try_load(&self, repo: &RepoRef) -> AnyhowResult<Option<PersistedTarball>> {
        let tar_path = self.tar_path(repo);
        if !fs::try_exists(&tar_path).await.unwrap_or(false) {
            debug!("No cached tarball at {}", tar_path.display());
            return Ok(None);
        }

        let tar_bytes = fs::read(&tar_path)
            .await
            .context(format!("Failed to read {}", tar_path.display()))?;
        let expected = fs::read_to_string(self.digest_path(repo))
            .await
            .context("Failed to read digest sidecar")?;
        if !verify_tarball_digest(&tar_bytes, &expected) {
            return Err(anyhow::anyhow!("Digest mismatch for {}", tar_path.display()));
        }

        let modified = fs::metadata(&tar_path)
            .await
            .and_then(|meta| meta.modified())
            .context("Failed to read modification time")?;
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);

        Ok(Some(PersistedTarball { tar_bytes, age }))
    }

    /// Writes `tar_bytes` as the stored tarball for `repo`.
    pub async fn store(&self, repo: &RepoRef, tar_bytes: &[u8]) {
        if let Err(e) = self.try_store(repo, tar_bytes).await {
            warn!("Failed to persist tarball for {}: {:#}", repo, e);
        }
    }

    async fn try_store(&self, repo: &RepoRef, tar_bytes: &[u8]) -> AnyhowResult<()> {
        fs::create_dir_all(&self.dir)
            .await
            .context(format!("Failed to create {}", self.dir.display()))?;

        let tar_path = self.tar_path(repo);
        let digest_path = self.digest_path(repo);
        let tar_tmp = tar_path.with_extension("tar.tmp");
        let digest_tmp = digest_path.with_extension("sha256.tmp");

        // Rename into place so a concurrent reader never sees a half-written file.
        fs::write(&tar_tmp, tar_bytes)
            .await
            .context("Failed to write tarball")?;
        fs::write(&digest_tmp, compute_tarball_digest(tar_bytes))
            .await
            .context("Failed to write digest")?;
        fs::rename(&tar_tmp, &tar_path)
            .await
            .context("Failed to move tarball into place")?;
        fs::rename(&digest_tmp, &digest_path)
            .await
            .context("Failed to move digest into place")?;

        debug!("Persisted {} bytes to {}", tar_bytes.len(), tar_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> RepoRef {
        RepoRef::new("acme", "letters", "main")
    }

    #[tokio::test]
    async fn test_store_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());

        cache.store(&repo(), b"tar bytes").await;
        let loaded = cache.load(&repo()).await.unwrap();

        assert_eq!(loaded.tar_bytes, b"tar bytes");
        assert!(loaded.age < Duration::from_secs(60));
        let stem = repo().cache_stem();
        assert!(stem.starts_with("acme-letters-main-"));
        assert!(dir.path().join(format!("{}.tar", stem)).exists());
        assert!(dir.path().join(format!("{}.sha256", stem)).exists());
    }

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());
        assert!(cache.load(&repo()).await.is_none());
    }

    /// Tests that a tarball whose bytes no longer match the sidecar digest is ignored.
    #[tokio::test]
    async fn test_load_rejects_digest_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());
        cache.store(&repo(), b"tar bytes").await;
        std::fs::write(dir.path().join(format!("{}.tar", repo().cache_stem())), b"tampered").unwrap();

        assert!(cache.load(&repo()).await.is_none());
    }

    #[tokio::test]
    async fn test_refs_with_slashes_stay_in_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());
        let branch = RepoRef::new("acme", "letters", "feature/spring");

        cache.store(&branch, b"spring").await;

        assert!(dir.path().join(format!("{}.tar", branch.cache_stem())).exists());
        assert_eq!(cache.load(&branch).await.unwrap().tar_bytes, b"spring");
    }

    /// Tests that a ref containing a slash and its underscore twin keep separate copies.
    #[tokio::test]
    async fn test_similar_refs_do_not_share_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());
        let slashed = RepoRef::new("acme", "letters", "feature/x");
        let underscored = RepoRef::new("acme", "letters", "feature_x");

        cache.store(&slashed, b"slashed").await;
        cache.store(&underscored, b"underscored").await;

        assert_eq!(cache.load(&slashed).await.unwrap().tar_bytes, b"slashed");
        assert_eq!(cache.load(&underscored).await.unwrap().tar_bytes, b"underscored");
    }
}
