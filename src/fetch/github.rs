use super::types::{RepoRef, TarballSource};
use crate::error::{NewsletterError, Result};
use crate::utils::compute_tarball_digest;
use async_trait::async_trait;
use flate2::read::GzDecoder;
use log::info;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use std::io::Read;

/// Default GitHub REST API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";

/// Fetches repository tarballs from the GitHub REST API.
///
/// Each call issues exactly one `GET {api_base}/repos/{owner}/{repo}/tarball/{ref}` with a bearer
/// token, then gunzips the body. There is no retry here: a failed fetch surfaces to the caller, and
/// the repository cache decides when to try again.
#[derive(Debug, Clone)]
pub struct GithubTarballClient {
    client: Client,
    api_base: String,
    token: String,
}

impl GithubTarballClient {
    /// Creates a client talking to the public GitHub API.
    ///
    /// # Arguments
    ///
    /// * `token` - Personal access or installation token sent as `Authorization: Bearer {token}`.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_api_base(token, DEFAULT_API_BASE)
    }

    /// Creates a client against a custom API base URL (e.g., a GitHub Enterprise host).
    pub fn with_api_base(token: impl Into<String>, api_base: &str) -> Self {
        Self {
            client: Client::new(),
            api_base: normalize_url(api_base),
            token: token.into(),
        }
    }

    fn request_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| NewsletterError::Configuration("token contains invalid header characters".to_string()))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github.raw"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("newsletter_source/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
        Ok(headers)
    }
}

#[async_trait]
impl TarballSource for GithubTarballClient {
    /// Downloads and decompresses the tarball for `repo`.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<u8>)` - The raw (uncompressed) tar bytes.
    /// * `Err(NewsletterError::UpstreamFetch)` - GitHub answered with a non-2xx status.
    /// * `Err(NewsletterError::Transport)` - The request or body download failed.
    /// * `Err(NewsletterError::CorruptArchive)` - The body was not valid gzip.
    async fn fetch_tarball(&self, repo: &RepoRef) -> Result<Vec<u8>> {
        let url = tarball_url(&self.api_base, repo);
        info!("Fetching tarball for {} from {}", repo, url);

        let resp = self
            .client
            .get(&url)
            .headers(self.request_headers()?)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NewsletterError::UpstreamFetch {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let compressed = resp.bytes().await?;
        let tar_bytes = gunzip(&compressed)?;
        info!(
            "Fetched tarball for {}: {} bytes compressed, {} bytes unpacked, sha256 {}",
            repo,
            compressed.len(),
            tar_bytes.len(),
            compute_tarball_digest(&tar_bytes)
        );
        Ok(tar_bytes)
    }
}

/// Builds the tarball endpoint URL for a repository snapshot.
///
/// `api_base` must already carry a trailing slash.
pub fn tarball_url(api_base: &str, repo: &RepoRef) -> String {
    format!(
        "{}repos/{}/{}/tarball/{}",
        api_base, repo.owner, repo.repo, repo.git_ref
    )
}

/// Decompresses a gzip stream held in memory.
///
/// Any decoder failure is reported as [`NewsletterError::CorruptArchive`].
pub fn gunzip(compressed: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(compressed);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| NewsletterError::CorruptArchive(format!("gzip decode failed: {}", e)))?;
    Ok(decompressed)
}

/// Normalizes the base URL by ensuring it ends with a trailing slash.
fn normalize_url(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    /// Tests the `normalize_url` function to ensure it correctly adds a trailing slash.
    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("https://api.github.com"), "https://api.github.com/");
        assert_eq!(normalize_url("https://api.github.com/"), "https://api.github.com/");
    }

    #[test]
    fn test_tarball_url() {
        let repo = RepoRef::new("acme", "letters", "main");
        assert_eq!(
            tarball_url("https://api.github.com/", &repo),
            "https://api.github.com/repos/acme/letters/tarball/main"
        );
    }

    #[test]
    fn test_request_headers_carry_bearer_token() {
        let client = GithubTarballClient::new("abc123");
        let headers = client.request_headers().unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer abc123");
        assert_eq!(headers[ACCEPT], "application/vnd.github.raw");
        assert!(headers.contains_key(USER_AGENT));
    }

    #[test]
    fn test_request_headers_reject_newline_in_token() {
        let client = GithubTarballClient::new("abc\n123");
        assert!(matches!(
            client.request_headers(),
            Err(NewsletterError::Configuration(_))
        ));
    }

    #[test]
    fn test_gunzip_valid_stream() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"tar bytes").unwrap();
        let compressed = encoder.finish().unwrap();
        assert_eq!(gunzip(&compressed).unwrap(), b"tar bytes");
    }

    /// Tests that non-gzip input is reported as a corrupt archive rather than an I/O error.
    #[test]
    fn test_gunzip_rejects_garbage() {
        let result = gunzip(b"definitely not gzip");
        assert!(matches!(result, Err(NewsletterError::CorruptArchive(_))));
    }
}
