//! Newsletter Source Library
//!
//! This library fetches a newsletter repository from GitHub as a single tarball, indexes the
//! markdown issues and their attachments, and serves them from a stale-while-revalidate cache.
//!

pub mod cache;
pub mod config;
pub mod content;
pub mod error;
pub mod fetch;
pub mod parse;
pub mod utils;

pub use content::{Asset, Newsletters};
pub use error::{NewsletterError, Result};
