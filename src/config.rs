//! Startup configuration.
//!
//! [`ConfigOptions`] holds whatever the caller collected (CLI flags, environment variables);
//! [`Config::from_options`] validates it. A missing access token or repository is reported here,
//! before any network request is attempted.

use crate::cache::{CacheMode, DiskCache, DEFAULT_TTL};
use crate::error::{NewsletterError, Result};
use crate::fetch::{RepoRef, DEFAULT_API_BASE};
use crate::parse::{
    NewsletterLayout, DEFAULT_CONTENT_ROOT, DEFAULT_DIRECTORY_PREFIX, DEFAULT_EXTENSION, DEFAULT_FILE_TOKEN,
};
use std::path::PathBuf;
use std::time::Duration;

/// Unvalidated configuration inputs. Every field is optional; defaults are applied by
/// [`Config::from_options`].
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    pub token: Option<String>,
    /// `"owner/repo"` or a `https://github.com/owner/repo` URL. Takes precedence over
    /// `owner` and `repo`.
    pub owner_repo: Option<String>,
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub git_ref: Option<String>,
    pub ttl_millis: Option<u64>,
    pub no_cache: bool,
    pub cache_dir: Option<PathBuf>,
    pub no_disk_cache: bool,
    pub api_base: Option<String>,
    pub content_root: Option<String>,
    pub directory_prefix: Option<String>,
    pub file_token: Option<String>,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub repo: RepoRef,
    pub ttl: Duration,
    pub mode: CacheMode,
    pub disk_cache: Option<DiskCache>,
    pub api_base: String,
    pub layout: NewsletterLayout,
}

impl Config {
    pub fn from_options(options: ConfigOptions) -> Result<Self> {
        let token = options
            .token
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| NewsletterError::Configuration("an access token is required".to_string()))?;

        let (owner, repo) = match options.owner_repo.as_deref() {
            Some(owner_repo) => parse_owner_repo(owner_repo)?,
            None => match (options.owner, options.repo) {
                (Some(owner), Some(repo)) if !owner.is_empty() && !repo.is_empty() => (owner, repo),
                _ => {
                    return Err(NewsletterError::Configuration(
                        "repository owner and name are required".to_string(),
                    ))
                }
            },
        };
        let git_ref = options
            .git_ref
            .filter(|git_ref| !git_ref.is_empty())
            .unwrap_or_else(|| "main".to_string());

        let ttl = options.ttl_millis.map(Duration::from_millis).unwrap_or(DEFAULT_TTL);
        let mode = if options.no_cache {
            CacheMode::Bypass
        } else {
            CacheMode::Cached
        };
        let disk_cache = if options.no_disk_cache || options.no_cache {
            None
        } else {
            Some(DiskCache::new(options.cache_dir.unwrap_or_else(DiskCache::default_dir)))
        };

        let layout = NewsletterLayout::new(
            options.content_root.as_deref().unwrap_or(DEFAULT_CONTENT_ROOT),
            options.directory_prefix.as_deref().unwrap_or(DEFAULT_DIRECTORY_PREFIX),
            options.file_token.as_deref().unwrap_or(DEFAULT_FILE_TOKEN),
            DEFAULT_EXTENSION,
        )?;

        Ok(Self {
            token,
            repo: RepoRef::new(owner, repo, git_ref),
            ttl,
            mode,
            disk_cache,
            api_base: options.api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            layout,
        })
    }
}

/// Splits `"owner/repo"` into its two parts.
///
/// Also accepts GitHub URLs such as `https://github.com/owner/repo.git`.
///
/// # Examples
///
/// ```rust
/// use newsletter_source::config::parse_owner_repo;
///
/// assert_eq!(
///     parse_owner_repo("acme/letters").unwrap(),
///     ("acme".to_string(), "letters".to_string())
/// );
/// ```
pub fn parse_owner_repo(value: &str) -> Result<(String, String)> {
    let path = value
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.");
    let path = path.strip_prefix("github.com/").unwrap_or(path);
    let path = path.trim_end_matches('/');

    let parts: Vec<&str> = path.split('/').collect();
    match parts.as_slice() {
        [owner, repo] if !owner.is_empty() && !repo.is_empty() => {
            let repo = repo.trim_end_matches(".git");
            if repo.is_empty() {
                return Err(invalid_owner_repo(value));
            }
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(invalid_owner_repo(value)),
    }
}

fn invalid_owner_repo(value: &str) -> NewsletterError {
    NewsletterError::Configuration(format!("expected \"owner/repo\", got {:?}", value))
}
