//! # Fetching Repository Tarballs from GitHub
//!
//! This module retrieves a whole-repository snapshot as a single gzip-compressed tar archive from
//! the GitHub REST API (`/repos/{owner}/{repo}/tarball/{ref}`) and decompresses it in memory. The
//! resulting tar bytes are handed to the `parse` module for extraction.
//!
//! ## Usage
//!
//! Construct a [`GithubTarballClient`] with an access token and call
//! [`TarballSource::fetch_tarball`] with a [`RepoRef`]. Code that only needs "some source of tar
//! bytes", such as the repository cache, depends on the [`TarballSource`] trait instead.
//!
//! ## Submodules
//!
//! - **github**: The reqwest-backed GitHub client and gzip handling.
//! - **types**: The repository identifier and the source trait.

mod github;
mod types;

pub use github::{gunzip, tarball_url, GithubTarballClient, DEFAULT_API_BASE};
pub use types::{RepoRef, TarballSource};
