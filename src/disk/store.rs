//! Disk Cache Module
//!
//! Byte payloads stored one file per key, each optionally prefixed with the
//! expiry header, with size and count ceilings enforced by LRU eviction.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::constants::CACHE_FILE_PREFIX;
use crate::disk::fs::{FileStore, StdFileStore};
use crate::disk::header;
use crate::disk::index::DiskEvictionIndex;
use crate::error::{validate_key, CacheError, Result};
use crate::stats::CacheStats;
use crate::ttl::Ttl;

#[derive(Debug)]
struct Inner {
    index: DiskEvictionIndex,
    stats: CacheStats,
}

impl Inner {
    fn sync_total(&mut self) {
        let len = self.index.len();
        self.stats.set_total_entries(len);
    }
}

/// Lifecycle fixed at construction.
#[derive(Debug)]
enum DiskState {
    /// Directory could not be prepared; every call reports failure.
    Unavailable { reason: String },
    Ready(Mutex<Inner>),
}

// == Disk Cache ==
/// On-disk cache tier.
///
/// Index mutations, writes and deletions are serialized by one lock. Reads
/// load the file outside the lock and re-validate against the index before
/// trusting what they read.
#[derive(Debug)]
pub struct DiskCache<F: FileStore = StdFileStore> {
    dir: PathBuf,
    fs: F,
    clock: Arc<dyn Clock>,
    max_bytes: u64,
    max_entries: usize,
    state: DiskState,
}

impl DiskCache<StdFileStore> {
    /// Opens a cache in `dir` on the local filesystem.
    pub fn open(dir: impl Into<PathBuf>, max_bytes: u64, max_entries: usize) -> Self {
        Self::open_with(dir, max_bytes, max_entries, StdFileStore, Arc::new(SystemClock))
    }

    pub fn from_config(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self::open_with(
            config.disk_directory.clone(),
            config.disk_max_bytes,
            config.disk_max_entries,
            StdFileStore,
            clock,
        )
    }
}

impl<F: FileStore> DiskCache<F> {
    // == Constructor ==
    /// Prepares the directory and rebuilds the index from the files already in it.
    ///
    /// Never fails: if the directory cannot be prepared the cache is built in
    /// the unavailable state.
    pub fn open_with(
        dir: impl Into<PathBuf>,
        max_bytes: u64,
        max_entries: usize,
        fs: F,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let dir = dir.into();
        let state = match rebuild_index(&dir, &fs, max_bytes, max_entries) {
            Ok(inner) => {
                info!(
                    dir = %dir.display(),
                    entries = inner.index.len(),
                    bytes = inner.index.total_bytes(),
                    "disk cache opened"
                );
                DiskState::Ready(Mutex::new(inner))
            }
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "disk cache unavailable");
                DiskState::Unavailable {
                    reason: format!("{}: {}", dir.display(), err),
                }
            }
        };

        Self {
            dir,
            fs,
            clock,
            max_bytes,
            max_entries,
            state,
        }
    }

    fn ready(&self) -> Result<&Mutex<Inner>> {
        match &self.state {
            DiskState::Ready(inner) => Ok(inner),
            DiskState::Unavailable { reason } => Err(CacheError::DiskUnavailable(reason.clone())),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state, DiskState::Ready(_))
    }

    pub fn directory(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    // == Put ==
    /// Writes `payload` under `key`, then evicts until both ceilings hold.
    ///
    /// The index is only updated after the write succeeds.
    pub fn put(&self, key: &str, payload: &[u8], ttl: Ttl) -> Result<()> {
        validate_key(key)?;
        let state = self.ready()?;

        let now = self.clock.now_ms();
        let bytes = header::encode(ttl, payload, now);
        let name = cache_file_name(key);
        let path = self.path_for(&name);

        let mut inner = state.lock();
        if let Err(err) = self.fs.write_bytes(&path, &bytes) {
            warn!(key, path = %path.display(), error = %err, "disk cache write failed");
            return Err(err.into());
        }
        self.touch_file(&path, now);

        inner.index.insert(&name, bytes.len() as u64, now);
        self.evict(&mut inner);
        inner.sync_total();
        Ok(())
    }

    fn evict(&self, inner: &mut Inner) {
        for victim in inner.index.evict_over_limit() {
            inner.stats.record_eviction();
            debug!(file = %victim, "disk cache evicted least recently used entry");
            self.delete_file(&self.path_for(&victim));
        }
    }

    // == Get ==
    /// Returns the payload, or `None` when absent, expired or unreadable.
    ///
    /// Expired entries are deleted. Hits refresh the entry's last access time.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let state = self.ready().ok()?;
        let name = cache_file_name(key);
        let path = self.path_for(&name);

        let version = {
            let mut inner = state.lock();
            match inner.index.get(&name) {
                Some(entry) => entry.version(),
                None => {
                    inner.stats.record_miss();
                    return None;
                }
            }
        };

        let read = self.fs.read_bytes(&path);

        let now = self.clock.now_ms();
        let mut inner = state.lock();
        // Evicted, removed or rewritten while we were reading
        if inner.index.get(&name).map(|entry| entry.version()) != Some(version) {
            inner.stats.record_miss();
            return None;
        }

        let bytes = match read {
            Ok(bytes) => bytes,
            Err(err) => {
                if err.kind() == io::ErrorKind::NotFound {
                    inner.index.remove(&name);
                    inner.sync_total();
                }
                inner.stats.record_miss();
                debug!(key, error = %err, "disk cache read failed");
                return None;
            }
        };

        if header::is_due(&bytes, now) {
            inner.index.remove(&name);
            self.delete_file(&path);
            inner.stats.record_expiration();
            inner.sync_total();
            debug!(key, "disk cache entry expired on read");
            return None;
        }

        inner.index.touch(&name, now);
        inner.stats.record_hit();
        drop(inner);

        self.touch_file(&path, now);
        Some(header::strip(&bytes).to_vec())
    }

    // == Remove ==
    /// Deletes the entry. Returns whether it existed.
    pub fn remove(&self, key: &str) -> bool {
        let Ok(state) = self.ready() else {
            return false;
        };
        let name = cache_file_name(key);
        let path = self.path_for(&name);

        let mut inner = state.lock();
        let indexed = inner.index.remove(&name).is_some();
        let on_disk = self.fs.exists(&path) && self.delete_file(&path);
        inner.sync_total();
        indexed || on_disk
    }

    // == Clear ==
    /// Deletes every cache file in the directory and resets the index.
    ///
    /// Returns false if the tier is unavailable or any file could not be deleted.
    pub fn clear(&self) -> bool {
        let Ok(state) = self.ready() else {
            return false;
        };
        let mut inner = state.lock();

        let files = match self.fs.list(&self.dir) {
            Ok(files) => files,
            Err(err) => {
                warn!(dir = %self.dir.display(), error = %err, "disk cache clear failed to list directory");
                return false;
            }
        };

        let mut all_deleted = true;
        for file in files.iter().filter(|f| f.name.starts_with(CACHE_FILE_PREFIX)) {
            match self.fs.delete(&self.path_for(&file.name)) {
                Ok(_) => {
                    inner.index.remove(&file.name);
                }
                Err(err) => {
                    all_deleted = false;
                    warn!(file = %file.name, error = %err, "disk cache clear failed to delete file");
                }
            }
        }
        if all_deleted {
            inner.index.clear();
        }
        inner.sync_total();
        info!(dir = %self.dir.display(), all_deleted, "disk cache cleared");
        all_deleted
    }

    // == Statistics ==
    /// Total bytes on disk, headers included. 0 when unavailable.
    pub fn size_bytes(&self) -> u64 {
        self.ready()
            .map(|state| state.lock().index.total_bytes())
            .unwrap_or(0)
    }

    /// Number of entries on disk. 0 when unavailable.
    pub fn count(&self) -> usize {
        self.ready()
            .map(|state| state.lock().index.len())
            .unwrap_or(0)
    }

    pub fn stats(&self) -> CacheStats {
        self.ready()
            .map(|state| {
                let inner = state.lock();
                let mut stats = inner.stats.clone();
                stats.set_total_entries(inner.index.len());
                stats
            })
            .unwrap_or_default()
    }

    fn delete_file(&self, path: &Path) -> bool {
        match self.fs.delete(path) {
            Ok(existed) => existed,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "failed to delete cache file");
                false
            }
        }
    }

    /// Persists recency in the file's mtime so a later run rebuilds the same LRU order.
    fn touch_file(&self, path: &Path, now_ms: u64) {
        if let Err(err) = self.fs.set_modified_ms(path, now_ms) {
            debug!(path = %path.display(), error = %err, "failed to update cache file mtime");
        }
    }
}

// == File Naming ==
/// File name holding `key`: the cache prefix plus the hex SHA-256 of the key.
pub fn cache_file_name(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("{}{}", CACHE_FILE_PREFIX, hex::encode(digest))
}

/// Creates the directory and indexes the cache files already in it, oldest first.
fn rebuild_index<F: FileStore>(
    dir: &Path,
    fs: &F,
    max_bytes: u64,
    max_entries: usize,
) -> io::Result<Inner> {
    fs.create_dir_all(dir)?;

    let mut files: Vec<_> = fs
        .list(dir)?
        .into_iter()
        .filter(|f| f.name.starts_with(CACHE_FILE_PREFIX))
        .collect();
    files.sort_by(|a, b| {
        a.modified_ms
            .cmp(&b.modified_ms)
            .then_with(|| a.name.cmp(&b.name))
    });

    let mut index = DiskEvictionIndex::new(max_bytes, max_entries);
    for file in &files {
        index.insert(&file.name, file.len, file.modified_ms);
    }

    let mut stats = CacheStats::new();
    for victim in index.evict_over_limit() {
        stats.record_eviction();
        if let Err(err) = fs.delete(&dir.join(&victim)) {
            debug!(file = %victim, error = %err, "failed to delete cache file over ceiling");
        }
    }

    let mut inner = Inner { index, stats };
    inner.sync_total();
    Ok(inner)
}
