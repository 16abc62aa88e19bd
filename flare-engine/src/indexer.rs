use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::{Mutex, RwLock};

use crate::cache::{CacheStore, Collection};
use crate::desktop;
use crate::item::{IndexedItem, UsageRecord};
use crate::walker;

#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub cache_dir: PathBuf,
    /// Desktop entry directories, highest priority first.
    pub application_dirs: Vec<PathBuf>,
    pub file_roots: Vec<PathBuf>,
    pub max_depth: usize,
    pub max_files: usize,
}

impl IndexerConfig {
    pub const DEFAULT_MAX_DEPTH: usize = 4;
    pub const DEFAULT_MAX_FILES: usize = 20_000;

    /// Standard locations, with the cache kept in `cache_dir`.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            application_dirs: desktop::default_application_dirs(),
            file_roots: walker::default_file_roots(),
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_files: Self::DEFAULT_MAX_FILES,
        }
    }
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self::new(default_cache_dir())
    }
}

/// `$XDG_CACHE_HOME/flare`
pub fn default_cache_dir() -> PathBuf {
    match xdg::BaseDirectories::with_prefix("flare") {
        Ok(xdg_dirs) => xdg_dirs.get_cache_home(),
        Err(_) => dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("flare"),
    }
}

fn now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |d| d.as_secs_f64())
}

/// Owns the application, file and usage collections and their cache.
///
/// Each snapshot sits behind its own swappable `Arc`: readers clone the
/// reference and never wait for a re-index, which builds the replacement
/// off to the side.
pub struct Indexer {
    config: IndexerConfig,
    store: CacheStore,
    apps: RwLock<Arc<Vec<IndexedItem>>>,
    files: RwLock<Arc<Vec<IndexedItem>>>,
    usage: Mutex<HashMap<String, UsageRecord>>,
    // Serializes usage writes so a later snapshot never lands before an
    // earlier one.
    usage_save: Mutex<()>,
    indexing: AtomicBool,
}

struct IndexingFlag<'a>(&'a AtomicBool);

impl Drop for IndexingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Indexer {
    /// Creates the indexer and loads whatever the cache holds.
    pub fn new(config: IndexerConfig) -> Self {
        let indexer = Self {
            store: CacheStore::new(&config.cache_dir),
            config,
            apps: RwLock::new(Arc::default()),
            files: RwLock::new(Arc::default()),
            usage: Mutex::new(HashMap::new()),
            usage_save: Mutex::new(()),
            indexing: AtomicBool::new(false),
        };
        indexer.load_caches();
        indexer
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    pub fn is_indexing(&self) -> bool {
        self.indexing.load(Ordering::Acquire)
    }

    #[cfg(test)]
    pub(crate) fn set_indexing(&self, busy: bool) {
        self.indexing.store(busy, Ordering::Release);
    }

    pub fn index_applications(&self) -> Vec<IndexedItem> {
        desktop::scan_applications(&self.config.application_dirs)
            .into_iter()
            .map(IndexedItem::Application)
            .collect()
    }

    pub fn index_files(&self, max_depth: usize, max_files: usize) -> Vec<IndexedItem> {
        walker::scan_files(&self.config.file_roots, max_depth, max_files)
            .into_iter()
            .map(IndexedItem::File)
            .collect()
    }

    /// Rescans applications and files, installs the new snapshots and saves
    /// every collection.
    ///
    /// Returns `false` without doing anything if a pass is already running.
    pub fn index_all(&self) -> bool {
        if self
            .indexing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::info!("indexing already in progress");
            return false;
        }
        let _flag = IndexingFlag(&self.indexing);

        tracing::info!("starting full index");
        let apps = self.index_applications();
        tracing::info!(count = apps.len(), "indexed applications");
        *self.apps.write() = Arc::new(apps);

        let files = self.index_files(self.config.max_depth, self.config.max_files);
        tracing::info!(count = files.len(), "indexed files");
        *self.files.write() = Arc::new(files);

        if self.save_caches() {
            tracing::info!("index complete and saved");
        }
        true
    }

    /// Runs [`Indexer::index_all`] on a background thread. `None` if a pass
    /// is already in flight.
    pub fn index_all_async(self: &Arc<Self>) -> Option<JoinHandle<bool>> {
        if self.is_indexing() {
            tracing::info!("indexing already in progress");
            return None;
        }
        let indexer = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("flare-indexer".into())
            .spawn(move || indexer.index_all());
        match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "cannot start indexing thread");
                None
            }
        }
    }

    pub fn apps(&self) -> Arc<Vec<IndexedItem>> {
        Arc::clone(&self.apps.read())
    }

    pub fn files(&self) -> Arc<Vec<IndexedItem>> {
        Arc::clone(&self.files.read())
    }

    /// Counts one use of `identity` and writes the usage collection straight
    /// away.
    pub fn record_usage(&self, identity: &str) {
        self.record_usage_at(identity, now());
    }

    pub(crate) fn record_usage_at(&self, identity: &str, timestamp: f64) {
        let _save = self.usage_save.lock();
        let snapshot = {
            let mut usage = self.usage.lock();
            let record = usage.entry(identity.to_string()).or_default();
            record.count += 1;
            record.last_used = timestamp;
            usage.clone()
        };

        // Readers only wait for the increment, not for the disk.
        if let Err(e) = self.store.save(Collection::Usage, &snapshot) {
            tracing::warn!(error = %e, "failed to save usage data");
        }
    }

    /// Zeroed record for identities that were never used.
    pub fn get_usage(&self, identity: &str) -> UsageRecord {
        self.usage.lock().get(identity).copied().unwrap_or_default()
    }

    /// Loads each collection on its own; one that cannot be read comes back
    /// empty without affecting the others.
    pub fn load_caches(&self) {
        *self.apps.write() = Arc::new(self.load_collection(Collection::Applications));
        *self.files.write() = Arc::new(self.load_collection(Collection::Files));
        *self.usage.lock() = self.load_collection(Collection::Usage);
    }

    fn load_collection<T>(&self, collection: Collection) -> T
    where
        T: serde::de::DeserializeOwned + Default,
    {
        self.store.load(collection).unwrap_or_else(|e| {
            tracing::warn!(
                path = %self.store.path(collection).display(),
                error = %e,
                "error loading cache"
            );
            T::default()
        })
    }

    /// Saves each collection on its own. `true` if all three were written.
    pub fn save_caches(&self) -> bool {
        let apps = self.apps();
        let files = self.files();
        let _save = self.usage_save.lock();
        let usage = self.usage.lock().clone();
        let results = [
            self.store.save(Collection::Applications, apps.as_slice()),
            self.store.save(Collection::Files, files.as_slice()),
            self.store.save(Collection::Usage, &usage),
        ];

        let mut ok = true;
        for (collection, result) in Collection::ALL.into_iter().zip(results) {
            if let Err(e) = result {
                tracing::warn!(
                    path = %self.store.path(collection).display(),
                    error = %e,
                    "error saving cache"
                );
                ok = false;
            }
        }
        ok
    }
}
