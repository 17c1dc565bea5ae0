//! Query functions over the cached repository contents.
//!
//! [`Newsletters`] binds a [`RepositoryCache`] to one repository snapshot and answers the three
//! questions an HTTP or static-site layer asks: which issues exist, what is an issue's markdown,
//! and what are the bytes of a file stored next to it.

use crate::cache::RepositoryCache;
use crate::error::{NewsletterError, Result};
use crate::fetch::RepoRef;
use crate::parse::ItemMetadata;
use std::sync::Arc;

/// Media type used when a filename's extension is not recognised.
pub const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// An auxiliary file (image, attachment) stored in an issue directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub bytes: Vec<u8>,
    pub media_type: &'static str,
}

pub struct Newsletters {
    cache: Arc<RepositoryCache>,
    repo: RepoRef,
}

impl Newsletters {
    pub fn new(cache: Arc<RepositoryCache>, repo: RepoRef) -> Self {
        Self { cache, repo }
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    pub fn cache(&self) -> &RepositoryCache {
        &self.cache
    }

    /// Lists every issue, highest number first.
    pub async fn list_items(&self) -> Result<Vec<ItemMetadata>> {
        let contents = self.cache.get_or_refresh(&self.repo).await?;
        Ok(contents.items().to_vec())
    }

    /// Returns the markdown of issue `number`.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The primary file decoded as UTF-8.
    /// * `Err(NewsletterError::ItemNotFound)` - No such issue, or its file is missing from the bundle.
    /// * `Err(NewsletterError::InvalidContent)` - The file is not valid UTF-8.
    pub async fn fetch_primary_content(&self, number: u32) -> Result<String> {
        let contents = self.cache.get_or_refresh(&self.repo).await?;
        let item = contents
            .item(number)
            .ok_or(NewsletterError::ItemNotFound { number })?;
        let bytes = contents
            .get_content(&item.path)
            .ok_or(NewsletterError::ItemNotFound { number })?;
        String::from_utf8(bytes.to_vec()).map_err(|_| NewsletterError::InvalidContent { number })
    }

    /// Returns `filename` from the directory of issue `number`, with its media type.
    ///
    /// The path is built from the naming convention and looked up directly, so this works for
    /// directories that did not qualify as a listed issue.
    pub async fn fetch_auxiliary_file(&self, number: u32, filename: &str) -> Result<Asset> {
        let contents = self.cache.get_or_refresh(&self.repo).await?;
        let path = self.cache.layout().item_file_path(number, filename);
        let bytes = contents
            .get_content(&path)
            .ok_or_else(|| NewsletterError::AuxiliaryFileNotFound {
                number,
                filename: filename.to_string(),
            })?;
        Ok(Asset {
            bytes: bytes.to_vec(),
            media_type: media_type_for(filename),
        })
    }
}

/// Maps a filename's extension to its media type.
pub fn media_type_for(filename: &str) -> &'static str {
    let Some((_, extension)) = filename.rsplit_once('.') else {
        return FALLBACK_MEDIA_TYPE;
    };
    match extension.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "bmp" => "image/bmp",
        "md" => "text/markdown; charset=utf-8",
        "txt" => "text/plain; charset=utf-8",
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "js" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        _ => FALLBACK_MEDIA_TYPE,
    }
}
