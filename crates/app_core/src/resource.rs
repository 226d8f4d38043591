//! Preview cache: raw media bytes kept in RAM for the detail page

use crate::error::AppError;
use app_fs::metadata::{details_from_bytes, MediaDetails};
use app_fs::MediaItem;
use lru::LruCache;
use parking_lot::Mutex;
use std::sync::Arc;

/// Media bytes read once for display and metadata
#[derive(Debug)]
pub struct Preview {
    pub item: MediaItem,
    pub data: Vec<u8>,
}

impl Preview {
    pub fn details(&self) -> MediaDetails {
        details_from_bytes(self.item.kind(), &self.data)
    }
}

/// LRU cache bounded by the total size of its entries
pub struct PreviewCache {
    entries: LruCache<u64, Arc<Preview>>,
    limit: usize,
    usage: usize,
}

impl PreviewCache {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: LruCache::unbounded(),
            limit,
            usage: 0,
        }
    }

    pub fn get(&mut self, item: &MediaItem) -> Option<Arc<Preview>> {
        self.entries.get(&item.id()).cloned()
    }

    /// Store a preview, evicting least recently used entries to stay under
    /// the limit. Entries larger than the whole limit are not kept.
    pub fn insert(&mut self, preview: Preview) -> Arc<Preview> {
        let size = preview.data.len();
        let key = preview.item.id();
        let preview = Arc::new(preview);

        if size > self.limit {
            tracing::debug!(uri = preview.item.uri(), size, "Preview too large to cache");
            return preview;
        }

        if let Some(old) = self.entries.put(key, preview.clone()) {
            self.usage = self.usage.saturating_sub(old.data.len());
        }
        self.usage += size;

        while self.usage > self.limit {
            match self.entries.pop_lru() {
                Some((_, evicted)) => {
                    self.usage = self.usage.saturating_sub(evicted.data.len());
                }
                None => break,
            }
        }

        preview
    }

    pub fn remove(&mut self, item: &MediaItem) {
        if let Some(old) = self.entries.pop(&item.id()) {
            self.usage = self.usage.saturating_sub(old.data.len());
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.usage = 0;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            usage: self.usage,
            limit: self.limit,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub usage: usize,
    pub limit: usize,
}

/// Owner of the preview cache.
///
/// The cache is created on first use and dropped by [`ResourceHandle::release`].
pub struct ResourceHandle {
    limit: usize,
    cache: Mutex<Option<PreviewCache>>,
}

impl ResourceHandle {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            cache: Mutex::new(None),
        }
    }

    fn with_cache<R>(&self, f: impl FnOnce(&mut PreviewCache) -> R) -> R {
        let mut guard = self.cache.lock();
        let cache = guard.get_or_insert_with(|| {
            tracing::debug!(limit = self.limit, "Creating preview cache");
            PreviewCache::new(self.limit)
        });
        f(cache)
    }

    /// Cached preview for `item`, reading the file on a miss. Blocking.
    pub fn load(&self, item: &MediaItem) -> Result<Arc<Preview>, AppError> {
        if let Some(hit) = self.with_cache(|c| c.get(item)) {
            return Ok(hit);
        }

        let path = item
            .file_path()
            .ok_or_else(|| AppError::Source(format!("not a local item: {}", item)))?;
        let data = std::fs::read(&path).map_err(|e| app_fs::FsError::from_io(e, &path))?;

        let preview = Preview {
            item: item.clone(),
            data,
        };
        Ok(self.with_cache(|c| c.insert(preview)))
    }

    /// Metadata for the detail page, read from the cached bytes. Blocking.
    pub fn load_details(&self, item: &MediaItem) -> Result<MediaDetails, AppError> {
        Ok(self.load(item)?.details())
    }

    /// Forget a deleted item
    pub fn evict(&self, item: &MediaItem) {
        if let Some(cache) = self.cache.lock().as_mut() {
            cache.remove(item);
        }
    }

    pub fn is_allocated(&self) -> bool {
        self.cache.lock().is_some()
    }

    pub fn stats(&self) -> Option<CacheStats> {
        self.cache.lock().as_ref().map(PreviewCache::stats)
    }

    /// Drop the cache and its memory
    pub fn release(&self) {
        if let Some(cache) = self.cache.lock().take() {
            tracing::debug!(entries = cache.stats().entries, "Released preview cache");
        }
    }
}
