//! # Caching Repository Contents
//!
//! This module keeps assembled [`RepositoryContents`](crate::parse::RepositoryContents) bundles in
//! memory, keyed by owner, repository and ref, and revalidates them in the background once their
//! time-to-live has passed. Tarballs can additionally be persisted to disk so a restarted process
//! starts warm.
//!
//! ## Usage
//!
//! Build a [`RepositoryCache`] around a [`TarballSource`](crate::fetch::TarballSource) and call
//! [`RepositoryCache::get_or_refresh`]. Most callers go through
//! [`Newsletters`](crate::content::Newsletters) instead.
//!
//! ## Submodules
//!
//! - **store**: The in-memory stale-while-revalidate cache.
//! - **disk**: Best-effort tarball persistence in a temp directory.

mod disk;
mod store;

pub use disk::{DiskCache, PersistedTarball};
pub use store::{CacheMode, RepositoryCache, DEFAULT_TTL};
