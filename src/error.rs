//! # Errors Raised While Acquiring and Serving Newsletter Content
//!
//! Every fallible library operation returns [`NewsletterError`]. The variants fall into three
//! groups:
//!
//! - **Fatal configuration**: [`NewsletterError::Configuration`], raised before any fetch.
//! - **Acquisition failures**: [`NewsletterError::UpstreamFetch`], [`NewsletterError::Transport`]
//!   and [`NewsletterError::CorruptArchive`]. An HTTP layer should answer these with a 5xx.
//! - **Lookups that found nothing**: [`NewsletterError::ItemNotFound`] and
//!   [`NewsletterError::AuxiliaryFileNotFound`]. An HTTP layer should answer these with a 404.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NewsletterError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("upstream fetch failed: {status} {status_text}")]
    UpstreamFetch { status: u16, status_text: String },

    #[error("request to upstream failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("corrupt archive: {0}")]
    CorruptArchive(String),

    #[error("newsletter {number} not found")]
    ItemNotFound { number: u32 },

    #[error("file {filename} not found in newsletter {number}")]
    AuxiliaryFileNotFound { number: u32, filename: String },

    #[error("newsletter {number} is not valid UTF-8")]
    InvalidContent { number: u32 },
}

impl NewsletterError {
    /// Returns `true` for the expected "nothing there" outcomes of a lookup.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            NewsletterError::ItemNotFound { .. } | NewsletterError::AuxiliaryFileNotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, NewsletterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(NewsletterError::ItemNotFound { number: 3 }.is_not_found());
        assert!(NewsletterError::AuxiliaryFileNotFound {
            number: 3,
            filename: "a.png".to_string()
        }
        .is_not_found());
        assert!(!NewsletterError::CorruptArchive("bad".to_string()).is_not_found());
        assert!(!NewsletterError::UpstreamFetch {
            status: 502,
            status_text: "Bad Gateway".to_string()
        }
        .is_not_found());
    }

    #[test]
    fn test_upstream_message_includes_status() {
        let err = NewsletterError::UpstreamFetch {
            status: 404,
            status_text: "Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "upstream fetch failed: 404 Not Found");
    }
}
