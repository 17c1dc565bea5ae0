//! # Parsing Repository Tarballs into Newsletter Content
//!
//! This module turns the uncompressed tar bytes produced by the `fetch` module into a
//! [`RepositoryContents`] bundle: an index of every file under the content root, the bytes of each
//! of those files, and the list of newsletter issues derived from directory and filename
//! conventions.
//!
//! ## Usage
//!
//! [`build_contents`] runs the whole pipeline. [`extract_archive`] and [`derive_items`] are the two
//! stages it chains, exposed for callers that already hold one of the intermediate results.
//!
//! ## Submodules
//!
//! - **tarball**: Reads tar entries and keeps the ones below the content root.
//! - **newsletter**: Groups files by directory and derives issue metadata.
//! - **layout**: Naming conventions (content root, directory prefix, filename token).
//! - **types**: Data structures shared by the stages.

mod layout;
mod newsletter;
mod tarball;
mod types;

pub use layout::{
    NewsletterLayout, DEFAULT_CONTENT_ROOT, DEFAULT_DIRECTORY_PREFIX, DEFAULT_EXTENSION, DEFAULT_FILE_TOKEN,
};
pub use newsletter::derive_items;
pub use tarball::extract_archive;
pub use types::{ExtractedArchive, FileRecord, ItemMetadata, RepositoryContents};

use crate::error::Result;
use log::info;

/// Extracts an archive and derives its issue list in one step.
///
/// # Returns
///
/// * `Ok(RepositoryContents)` - The assembled bundle.
/// * `Err(NewsletterError::CorruptArchive)` - The tar structure could not be read.
pub fn build_contents(tar_bytes: &[u8], layout: &NewsletterLayout) -> Result<RepositoryContents> {
    let archive = extract_archive(tar_bytes, layout)?;
    let items = derive_items(&archive.files, layout);
    info!("Derived {} newsletter issue(s) from {} file(s)", items.len(), archive.files.len());
    Ok(RepositoryContents::new(archive, items))
}
