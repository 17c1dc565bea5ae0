//! Newsletter Source: Fetch, Index, and Serve Newsletter Issues from GitHub
//!
//! This application fetches a newsletter repository from GitHub as a single tarball, indexes
//! the numbered issue directories it contains, and prints issues or their attachments.
//!
//! ## Design Overview
//! - **Fetching**: Downloads and gunzips the repository tarball using the `fetch` module.
//! - **Parsing**: Extracts files below the content root and derives issue metadata using the `parse` module.
//! - **Caching**: Keeps the assembled contents in memory (and a tarball copy on disk) using the `cache` module.
//! - **Serving**: Answers list/show/asset queries through `content::Newsletters`.
//!
//! ## Dependencies
//! - **`reqwest`**: For HTTP requests to the GitHub tarball endpoint.
//! - **`tokio`**: For the asynchronous runtime and background refresh tasks.
//! - **`flate2` and `tar`**: For decompressing and reading the tarball.
//! - **`regex` and `chrono`**: For matching issue directory names and dated filenames.
//! - **`log` and `env_logger`**: For structured logging instead of `println!`.
//! - **`clap`**: For parsing command-line arguments to configure the application.
//! - **`serde_json`**: For `--json` output of the issue list.
//!
//! ## Usage
//! 1. Provide a GitHub token and the repository, either as arguments or environment variables:
//!    ```sh
//!    export GITHUB_TOKEN=ghp_...
//!    export NEWSLETTER_REPO=acme/newsletters
//!    ```
//! 2. List the issues, newest number first:
//!    ```sh
//!    cargo run -- list
//!    ```
//! 3. Print one issue's markdown, or save one of its attachments:
//!    ```sh
//!    cargo run -- show 12
//!    cargo run -- asset 12 cover.png --output cover.png
//!    ```
//! 4. Logs are written to stderr, controlled by the `RUST_LOG` environment variable:
//!    ```sh
//!    RUST_LOG=info cargo run -- list
//!    ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use newsletter_source::cache::RepositoryCache;
use newsletter_source::config::{Config, ConfigOptions};
use newsletter_source::fetch::GithubTarballClient;
use newsletter_source::Newsletters;
use std::path::PathBuf;
use std::sync::Arc;

/// Command-line arguments for configuring the Newsletter Source application.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
  /// GitHub access token used as a bearer credential.
  #[clap(long, env = "GITHUB_TOKEN", hide_env_values = true)]
  token: Option<String>,

  /// Repository as "owner/repo" (e.g., "acme/newsletters") or a github.com URL.
  #[clap(long, env = "NEWSLETTER_REPO")]
  repo: Option<String>,

  /// Repository owner, when --repo is not given.
  #[clap(long, env = "NEWSLETTER_OWNER")]
  owner: Option<String>,

  /// Repository name, when --repo is not given.
  #[clap(long, env = "NEWSLETTER_NAME")]
  name: Option<String>,

  /// Branch, tag or commit to read.
  #[clap(long = "ref", env = "NEWSLETTER_REF", default_value = "main")]
  git_ref: String,

  /// How long fetched contents stay fresh, in milliseconds.
  #[clap(long, env = "CACHE_TTL_MILLIS")]
  ttl_millis: Option<u64>,

  /// Fetch from scratch on every request instead of caching.
  #[clap(long, env = "NO_CACHE", action)]
  no_cache: bool,

  /// Directory for the on-disk tarball copy.
  #[clap(long, env = "NEWSLETTER_CACHE_DIR")]
  cache_dir: Option<PathBuf>,

  /// Do not read or write the on-disk tarball copy.
  #[clap(long, env = "NO_DISK_CACHE", action)]
  no_disk_cache: bool,

  /// GitHub API base URL.
  #[clap(long, env = "GITHUB_API_URL")]
  api_url: Option<String>,

  /// Directory holding the issues inside the repository.
  #[clap(long, default_value = "newsletters")]
  content_root: String,

  /// Issue directory prefix; directories are named "{prefix}-{number}".
  #[clap(long, default_value = "newsletter")]
  directory_prefix: String,

  /// Token in issue filenames, "{YYYY}-{MM}-{DD}-{token}-{number}.md".
  #[clap(long, default_value = "newsletter")]
  file_token: String,

  #[clap(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List every issue, newest number first.
  List {
    /// Print the list as JSON.
    #[clap(long, action)]
    json: bool,
  },
  /// Print the markdown of one issue.
  Show {
    number: u32,
  },
  /// Write a file stored in an issue directory.
  Asset {
    number: u32,
    filename: String,
    /// Destination path; defaults to the filename in the current directory.
    #[clap(long, short)]
    output: Option<PathBuf>,
  },
}

impl Args {
  fn config_options(&self) -> ConfigOptions {
    ConfigOptions {
      token: self.token.clone(),
      owner_repo: self.repo.clone(),
      owner: self.owner.clone(),
      repo: self.name.clone(),
      git_ref: Some(self.git_ref.clone()),
      ttl_millis: self.ttl_millis,
      no_cache: self.no_cache,
      cache_dir: self.cache_dir.clone(),
      no_disk_cache: self.no_disk_cache,
      api_base: self.api_url.clone(),
      content_root: Some(self.content_root.clone()),
      directory_prefix: Some(self.directory_prefix.clone()),
      file_token: Some(self.file_token.clone()),
    }
  }
}

/// Builds the cache from configuration and runs the requested command.
///
/// # Returns
/// - `Ok(())` if the command completed.
/// - `Err(anyhow::Error)` on configuration errors, fetch failures, or unknown issues.
#[tokio::main]
async fn main() -> Result<()> {
  // Initialize logging
  env_logger::init();

  let args = Args::parse();
  let config = Config::from_options(args.config_options()).context("Invalid configuration")?;
  info!("Reading newsletters from {}", config.repo);

  let source = Arc::new(GithubTarballClient::with_api_base(config.token.clone(), &config.api_base));
  let mut cache = RepositoryCache::new(source, config.layout.clone())
    .with_ttl(config.ttl)
    .with_mode(config.mode);
  if let Some(disk) = config.disk_cache.clone() {
    cache = cache.with_disk_cache(disk);
  }
  let newsletters = Newsletters::new(Arc::new(cache), config.repo.clone());

  match args.command {
    Command::List { json } => {
      let items = newsletters.list_items().await.context("Failed to list newsletters")?;
      if json {
        let listing: Vec<serde_json::Value> = items
          .iter()
          .map(|item| {
            serde_json::json!({
              "number": item.number,
              "date": item.date.to_string(),
              "path": item.path,
              "filename": item.filename,
            })
          })
          .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
      } else {
        for item in &items {
          println!("{:>5}  {}  {}", item.number, item.date, item.path);
        }
      }
    }
    Command::Show { number } => {
      let markdown = newsletters
        .fetch_primary_content(number)
        .await
        .context(format!("Failed to read newsletter {}", number))?;
      print!("{}", markdown);
    }
    Command::Asset { number, filename, output } => {
      let asset = newsletters
        .fetch_auxiliary_file(number, &filename)
        .await
        .context(format!("Failed to read {} from newsletter {}", filename, number))?;
      let output = output.unwrap_or_else(|| PathBuf::from(&filename));
      tokio::fs::write(&output, &asset.bytes)
        .await
        .context(format!("Failed to write {}", output.display()))?;
      info!("Wrote {} ({}, {} bytes)", output.display(), asset.media_type, asset.bytes.len());
    }
  }

  // A stale on-disk copy may have started a refresh; let it finish so the next run starts fresh.
  newsletters.cache().wait_for_refresh(newsletters.repo()).await;
  Ok(())
}
