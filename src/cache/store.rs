use super::disk::DiskCache;
use crate::error::Result;
use crate::fetch::{RepoRef, TarballSource};
use crate::parse::{build_contents, NewsletterLayout, RepositoryContents};
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use log::{debug, error, info};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use tokio::time::Instant;

/// Default lifetime of a cached bundle before it is considered stale.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Whether the cache keeps bundles between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// Bundles are kept and revalidated in the background once stale.
    Cached,
    /// Every call fetches and parses from scratch (local development).
    Bypass,
}

/// A spawned background refresh.
///
/// `done` resolves when the task ends and can be awaited by any number of callers, while the entry
/// keeps the task marked as in flight.
struct RefreshTask {
    handle: AbortHandle,
    done: Shared<BoxFuture<'static, ()>>,
}

/// Per-key state: the current bundle, when it goes stale, and the refresh task if one is running.
#[derive(Default)]
struct CacheEntry {
    payload: Option<Arc<RepositoryContents>>,
    expires_at: Option<Instant>,
    refresh: Option<RefreshTask>,
}

impl CacheEntry {
    fn refresh_in_flight(&self) -> bool {
        self.refresh.as_ref().is_some_and(|task| !task.handle.is_finished())
    }
}

/// Everything a fetch needs, shared with background refresh tasks.
struct Loader {
    source: Arc<dyn TarballSource>,
    layout: NewsletterLayout,
    disk: Option<DiskCache>,
}

impl Loader {
    /// Fetches from the network, persists the tarball and builds a fresh bundle.
    async fn load(&self, repo: &RepoRef) -> Result<RepositoryContents> {
        let tar_bytes = self.source.fetch_tarball(repo).await?;
        let contents = build_contents(&tar_bytes, &self.layout)?;
        if let Some(disk) = &self.disk {
            disk.store(repo, &tar_bytes).await;
        }
        Ok(contents)
    }

    /// First load for a key: prefers a persisted tarball.
    ///
    /// The age is `Some` only for a bundle read back from disk; a network load is always fresh.
    async fn load_cold(&self, repo: &RepoRef) -> Result<(RepositoryContents, Option<Duration>)> {
        if let Some(disk) = &self.disk {
            if let Some(persisted) = disk.load(repo).await {
                match build_contents(&persisted.tar_bytes, &self.layout) {
                    Ok(contents) => return Ok((contents, Some(persisted.age))),
                    Err(e) => error!("Discarding persisted tarball for {}: {}", repo, e),
                }
            }
        }
        Ok((self.load(repo).await?, None))
    }
}

/// Process-wide cache of repository bundles with stale-while-revalidate semantics.
///
/// - The first call for a key fetches synchronously; concurrent first callers wait for that one
///   fetch instead of starting their own.
/// - Within the TTL the stored bundle is returned without network access.
/// - Past the TTL the stored bundle is still returned immediately, and a single background refresh
///   is started for that key unless one is already running. A successful refresh swaps in the new
///   bundle; a failed one is logged and the old bundle stays until the next stale read retries.
///
/// Bundles are handed out as `Arc`s and replaced whole, so a reader never sees a partial update.
pub struct RepositoryCache {
    loader: Arc<Loader>,
    ttl: Duration,
    mode: CacheMode,
    entries: Mutex<HashMap<RepoRef, Arc<Mutex<CacheEntry>>>>,
}

impl RepositoryCache {
    pub fn new(source: Arc<dyn TarballSource>, layout: NewsletterLayout) -> Self {
        Self {
            loader: Arc::new(Loader {
                source,
                layout,
                disk: None,
            }),
            ttl: DEFAULT_TTL,
            mode: CacheMode::Cached,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_mode(mut self, mode: CacheMode) -> Self {
        self.mode = mode;
        self
    }

    /// Persists fetched tarballs under `disk` and reads them back on a cold start.
    pub fn with_disk_cache(mut self, disk: DiskCache) -> Self {
        self.loader = Arc::new(Loader {
            source: Arc::clone(&self.loader.source),
            layout: self.loader.layout.clone(),
            disk: Some(disk),
        });
        self
    }

    pub fn layout(&self) -> &NewsletterLayout {
        &self.loader.layout
    }

    /// Returns the bundle for `repo`, fetching or scheduling a refresh as its state requires.
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<RepositoryContents>)` - The current (possibly stale) bundle.
    /// * `Err(NewsletterError)` - Only when no bundle exists yet and the first fetch failed.
    pub async fn get_or_refresh(&self, repo: &RepoRef) -> Result<Arc<RepositoryContents>> {
        if self.mode == CacheMode::Bypass {
            debug!("Cache bypassed, loading {} from scratch", repo);
            return Ok(Arc::new(self.loader.load(repo).await?));
        }

        let slot = self.slot(repo).await;
        let mut entry = slot.lock().await;
        let now = Instant::now();

        let cached = match (&entry.payload, entry.expires_at) {
            (Some(payload), Some(expires_at)) => Some((Arc::clone(payload), expires_at)),
            _ => None,
        };
        let (payload, expires_at) = match cached {
            Some(cached) => cached,
            None => {
                // The entry lock stays held so concurrent first callers wait for this fetch.
                info!("No cached contents for {}, fetching", repo);
                let (contents, disk_age) = self.loader.load_cold(repo).await?;
                let payload = Arc::new(contents);
                let age = disk_age.unwrap_or(Duration::ZERO);
                entry.payload = Some(Arc::clone(&payload));
                entry.expires_at = Some(Instant::now() + self.ttl.saturating_sub(age));
                match disk_age {
                    // Only a persisted copy that has outlived the TTL needs revalidating now.
                    Some(age) if age >= self.ttl => (payload, now),
                    _ => return Ok(payload),
                }
            }
        };

        if now < expires_at {
            debug!("Serving fresh contents for {}", repo);
            return Ok(payload);
        }

        if entry.refresh_in_flight() {
            debug!("Serving stale contents for {}, refresh already running", repo);
        } else {
            info!("Serving stale contents for {}, starting background refresh", repo);
            entry.refresh = Some(self.spawn_refresh(repo.clone(), Arc::clone(&slot)));
        }
        Ok(payload)
    }

    /// Waits until the background refresh running for `repo`, if any, has finished.
    pub async fn wait_for_refresh(&self, repo: &RepoRef) {
        let Some(slot) = self.entries.lock().await.get(repo).cloned() else {
            return;
        };
        let done = match &slot.lock().await.refresh {
            Some(task) => task.done.clone(),
            None => return,
        };
        done.await;
    }

    async fn slot(&self, repo: &RepoRef) -> Arc<Mutex<CacheEntry>> {
        let mut entries = self.entries.lock().await;
        Arc::clone(entries.entry(repo.clone()).or_default())
    }

    /// Starts a background refresh; the returned task marks it as in flight until it finishes.
    fn spawn_refresh(&self, repo: RepoRef, slot: Arc<Mutex<CacheEntry>>) -> RefreshTask {
        let loader = Arc::clone(&self.loader);
        let ttl = self.ttl;
        let join = tokio::spawn(async move {
            match loader.load(&repo).await {
                Ok(contents) => {
                    let mut entry = slot.lock().await;
                    entry.payload = Some(Arc::new(contents));
                    entry.expires_at = Some(Instant::now() + ttl);
                    info!("Background refresh of {} complete", repo);
                }
                Err(e) => {
                    error!("Background refresh of {} failed, keeping stale contents: {}", repo, e);
                }
            }
        });
        RefreshTask {
            handle: join.abort_handle(),
            done: join.map(|_| ()).boxed().shared(),
        }
    }
}
