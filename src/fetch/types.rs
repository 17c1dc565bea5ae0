use crate::error::Result;
use crate::utils::compute_key_digest;
use async_trait::async_trait;
use std::fmt;

/// Identifies one repository snapshot: an owner, a repository name and a git ref.
///
/// This is also the key the repository cache stores its entries under, and its
/// [`RepoRef::cache_stem`] names the on-disk tarball file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    /// Account or organisation owning the repository (e.g., "acme").
    pub owner: String,
    /// Repository name (e.g., "newsletters").
    pub repo: String,
    /// Branch, tag or commit SHA to fetch (e.g., "main").
    pub git_ref: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, git_ref: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            git_ref: git_ref.into(),
        }
    }

    /// File stem used for the persisted tarball, `{owner}-{repo}-{ref}-{digest}`.
    ///
    /// The readable prefix has path separators replaced so the stem always names a single file.
    /// The trailing digest is taken over the unmodified parts, so keys that read the same once
    /// joined (`a`/`b-c` and `a-b`/`c`, or `feature/x` and `feature_x`) still get distinct files.
    pub fn cache_stem(&self) -> String {
        let readable = format!("{}-{}-{}", self.owner, self.repo, self.git_ref).replace(['/', '\\'], "_");
        let digest = compute_key_digest(&[self.owner.as_str(), self.repo.as_str(), self.git_ref.as_str()]);
        format!("{}-{}", readable, digest)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.owner, self.repo, self.git_ref)
    }
}

/// Anything that can hand back the decompressed tar bytes of a repository snapshot.
///
/// The GitHub client is the production implementation; tests substitute stubs that
/// count how often they are called.
#[async_trait]
pub trait TarballSource: Send + Sync {
    async fn fetch_tarball(&self, repo: &RepoRef) -> Result<Vec<u8>>;
}
