//! # Utility Functions for Newsletter Sources
//!
//! This module provides general helpers used throughout the crate.
//!
//! ## Submodules
//!
//! - **digest**: SHA-256 digests for fetched and persisted tarballs, and for on-disk cache keys.

mod digest;

pub use digest::{compute_key_digest, compute_tarball_digest, verify_tarball_digest};
