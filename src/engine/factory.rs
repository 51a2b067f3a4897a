// Composition factory — the entry point. Resolves the effective cache key,
// consults the task registry and the disk store, and returns a shared task
// producing a local file path. Only one fetch per key is ever in flight.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::engine::registry::TaskRegistry;
use crate::engine::store::DiskStore;
use crate::engine::task::{FileTask, Task};
use crate::error::LoadError;
use crate::source::http_source::HttpFetcher;
use crate::source::traits::{BundleProvider, NoBundles, ResourceFetcher};
use crate::spec::CompositionSpec;

pub struct CompositionFactory {
    store: Arc<DiskStore>,
    registry: Arc<TaskRegistry>,
    fetcher: Arc<dyn ResourceFetcher>,
    bundles: Arc<dyn BundleProvider>,
}

impl CompositionFactory {
    /// Factory with the default HTTP fetcher, no bundle provider, and a
    /// fresh registry. Must be created inside a tokio runtime.
    pub fn new(config: EngineConfig) -> Result<Self, LoadError> {
        let fetcher: Arc<dyn ResourceFetcher> = Arc::new(HttpFetcher::new(&config)?);
        Self::with_parts(
            config,
            Arc::new(TaskRegistry::new()),
            fetcher,
            Arc::new(NoBundles),
        )
    }

    /// Factory with injected collaborators. The registry decides dedup scope:
    /// share one registry to share in-flight fetches.
    pub fn with_parts(
        config: EngineConfig,
        registry: Arc<TaskRegistry>,
        fetcher: Arc<dyn ResourceFetcher>,
        bundles: Arc<dyn BundleProvider>,
    ) -> Result<Self, LoadError> {
        let store = Arc::new(DiskStore::new(config.cache_dir)?);
        Ok(Self {
            store,
            registry,
            fetcher,
            bundles,
        })
    }

    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<DiskStore> {
        &self.store
    }

    /// Fetch an animation from an HTTP URL. Once downloaded it is cached to
    /// disk, so this may be called ahead of time to warm the cache.
    pub fn from_url(&self, url: &str, cache_key: Option<&str>) -> Arc<FileTask> {
        self.url_task(url, cache_key, false)
    }

    /// Load an animation from a bundled asset by name.
    pub fn from_asset(&self, name: &str, cache_key: Option<&str>) -> Arc<FileTask> {
        self.asset_task(name, cache_key, false)
    }

    /// Load an animation from a bundled raw resource by id.
    pub fn from_raw_resource(&self, id: u32, cache_key: Option<&str>) -> Arc<FileTask> {
        self.resource_task(id, cache_key, false)
    }

    /// Load an animation from a local file. Performs a blocking readability
    /// check at the call site and fails fast if the path cannot be opened;
    /// do not call this from a context that disallows blocking I/O (the
    /// warm-cache pass skips this variant for exactly that reason).
    pub fn from_local_file(&self, path: &Path, cache_key: Option<&str>) -> Arc<FileTask> {
        self.local_file_task(path, cache_key, false)
    }

    /// Resolve a task for any descriptor. Used by the await path.
    pub fn task_for(&self, spec: &CompositionSpec, cache_key: Option<&str>) -> Arc<FileTask> {
        self.dispatch(spec, cache_key, false)
    }

    /// Evict whatever is registered under the effective key and start a
    /// fresh fetch. This is the retry path; unrelated callers keep seeing
    /// the stale terminal state until someone reloads.
    pub fn reload(&self, spec: &CompositionSpec, cache_key: Option<&str>) -> Arc<FileTask> {
        self.dispatch(spec, cache_key, true)
    }

    /// Warm-cache mode: register or start the fetch without awaiting it.
    /// Returns `None` for local files, whose call path opens a file
    /// descriptor and therefore needs a context where blocking is allowed;
    /// the caller's later await pass performs that fetch instead.
    pub fn warm(&self, spec: &CompositionSpec, cache_key: Option<&str>) -> Option<Arc<FileTask>> {
        match spec {
            CompositionSpec::LocalFile(path) => {
                debug!(
                    "warm-cache pass skipping local file {} (blocking open)",
                    path.display()
                );
                None
            }
            other => Some(self.dispatch(other, cache_key, false)),
        }
    }

    /// Drop every registered task and delete all published cache files.
    pub fn clear_cache(&self) -> Result<(), LoadError> {
        self.registry.clear();
        self.store.clear()
    }

    fn dispatch(&self, spec: &CompositionSpec, cache_key: Option<&str>, force: bool) -> Arc<FileTask> {
        match spec {
            CompositionSpec::Url(url) => self.url_task(url, cache_key, force),
            CompositionSpec::Asset(name) => self.asset_task(name, cache_key, force),
            CompositionSpec::RawResource(id) => self.resource_task(*id, cache_key, force),
            CompositionSpec::LocalFile(path) => self.local_file_task(path, cache_key, force),
        }
    }

    fn url_task(&self, url: &str, cache_key: Option<&str>, force: bool) -> Arc<FileTask> {
        let key = CompositionSpec::Url(url.to_string()).effective_cache_key(cache_key);
        let fetcher = Arc::clone(&self.fetcher);
        let store = Arc::clone(&self.store);
        let url = url.to_string();
        let write_key = key.clone();
        self.cache(&key, force, move || async move {
            let fetched = fetcher.fetch(&url).await?;
            store.write_and_publish(&write_key, &fetched.bytes).await
        })
    }

    fn asset_task(&self, name: &str, cache_key: Option<&str>, force: bool) -> Arc<FileTask> {
        let key = CompositionSpec::Asset(name.to_string()).effective_cache_key(cache_key);
        let bundles = Arc::clone(&self.bundles);
        let store = Arc::clone(&self.store);
        let name = name.to_string();
        let write_key = key.clone();
        self.cache(&key, force, move || async move {
            let bytes = bundles.load_asset(&name).await?;
            store.write_and_publish(&write_key, &bytes).await
        })
    }

    fn resource_task(&self, id: u32, cache_key: Option<&str>, force: bool) -> Arc<FileTask> {
        let key = CompositionSpec::RawResource(id).effective_cache_key(cache_key);
        let bundles = Arc::clone(&self.bundles);
        let store = Arc::clone(&self.store);
        let write_key = key.clone();
        self.cache(&key, force, move || async move {
            let bytes = bundles.load_resource(id).await?;
            store.write_and_publish(&write_key, &bytes).await
        })
    }

    fn local_file_task(&self, path: &Path, cache_key: Option<&str>, force: bool) -> Arc<FileTask> {
        let key =
            CompositionSpec::LocalFile(path.to_path_buf()).effective_cache_key(cache_key);

        // Fail fast on an unreadable path, before touching the registry.
        if let Err(e) = std::fs::File::open(path) {
            return Arc::new(Task::failed(LoadError::resolution(format!(
                "cannot read local file {}: {e}",
                path.display()
            ))));
        }

        let store = Arc::clone(&self.store);
        let path = path.to_path_buf();
        let write_key = key.clone();
        self.cache(&key, force, move || async move {
            let bytes = tokio::fs::read(&path).await.map_err(|e| {
                LoadError::resolution(format!("cannot read local file {}: {e}", path.display()))
            })?;
            store.write_and_publish(&write_key, &bytes).await
        })
    }

    /// Registry-then-disk resolution. On a registry hit the existing task is
    /// returned and no fetch starts. On a miss with a published disk entry,
    /// an already-succeeded task is synthesized and registered. Otherwise a
    /// pending task is registered first and the fetch is spawned onto the
    /// background runtime; the registration and lookup share one lock, so
    /// concurrent callers of the same key always coalesce.
    fn cache<F, Fut>(&self, key: &str, force: bool, make: F) -> Arc<FileTask>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<PathBuf, LoadError>> + Send + 'static,
    {
        self.registry.get_or_insert_with(key, force, || {
            if let Some(path) = self.store.lookup(key) {
                debug!("disk cache hit for key {}", key);
                return Arc::new(Task::completed(path));
            }

            debug!("key {} not cached, starting fetch", key);
            let task = Arc::new(FileTask::pending());
            let worker = Arc::clone(&task);
            let fut = make();
            let key = key.to_string();
            tokio::spawn(async move {
                let outcome = tokio::select! {
                    _ = worker.cancelled() => None,
                    result = fut => Some(result),
                };
                match outcome {
                    None => {
                        debug!("fetch for key {} cancelled", key);
                        worker.complete_err(LoadError::resolution(format!(
                            "fetch for key {key} cancelled"
                        )));
                    }
                    Some(Ok(path)) => worker.complete(path),
                    Some(Err(e)) => {
                        warn!("fetch for key {} failed: {}", key, e);
                        worker.complete_err(e);
                    }
                }
            });
            task
        })
    }
}
