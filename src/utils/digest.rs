use sha2::{Digest, Sha256};

/// Computes a SHA-256 digest of a tarball's raw bytes.
///
/// The digest is logged on every fetch and written next to the on-disk copy of the tarball so a
/// damaged file is detected before it is trusted.
///
/// # Arguments
///
/// * `tar_bytes` - The uncompressed tar archive.
///
/// # Returns
///
/// A hexadecimal string representation of the SHA-256 digest.
pub fn compute_tarball_digest(tar_bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(tar_bytes);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Short hex digest identifying a composite key.
///
/// Parts are joined with a NUL byte, which cannot occur in owners, repository names or git refs,
/// so `["a", "b-c"]` and `["a-b", "c"]` hash differently. Returns the first 16 hex characters.
pub fn compute_key_digest(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(parts.join("\0").as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(16);
    digest
}

/// Checks `tar_bytes` against a previously recorded hex digest.
///
/// Surrounding whitespace in `expected` is ignored, as sidecar files usually end in a newline.
pub fn verify_tarball_digest(tar_bytes: &[u8], expected: &str) -> bool {
    compute_tarball_digest(tar_bytes).eq_ignore_ascii_case(expected.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_tarball_digest() {
        let digest = compute_tarball_digest(b"");
        assert_eq!(digest.len(), 64); // SHA-256 produces a 32-byte (64 hex char) digest
        assert_eq!(
            digest,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_compute_key_digest_separates_parts() {
        let digest = compute_key_digest(&["acme", "letters", "main"]);
        assert_eq!(digest.len(), 16);
        assert_eq!(digest, compute_key_digest(&["acme", "letters", "main"]));
        assert_ne!(
            compute_key_digest(&["a", "b-c", "d"]),
            compute_key_digest(&["a-b", "c", "d"])
        );
    }

    #[test]
    fn test_verify_tarball_digest() {
        let digest = compute_tarball_digest(b"tar bytes");
        assert!(verify_tarball_digest(b"tar bytes", &format!("{}\n", digest)));
        assert!(verify_tarball_digest(b"tar bytes", &digest.to_uppercase()));
        assert!(!verify_tarball_digest(b"other bytes", &digest));
    }
}
