//! FeatureCache - previously computed features keyed by image name.
//!
//! The cache is an explicit handle: callers pass it (or a provider wrapping
//! it) into every `Frame::extract_features` call instead of reaching for a
//! process-wide instance. It is internally synchronized, so one handle can be
//! shared behind an `Arc` by several pipeline stages.
//!
//! Each entry may carry a per-point validity mask. A masked load returns only
//! the points whose mask entry is `true`; an unmasked load returns all of
//! them. Entries are evicted least-recently-used once `capacity` is exceeded.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use image::GrayImage;
use parking_lot::Mutex;
use tracing::debug;

use crate::config::FeatureCacheParams;
use crate::tracking::frame::{
    FeatureError, FeatureExtractor, FeatureProvider, FeatureSet, FeatureTriple,
};

/// Hit/miss/eviction counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

struct CacheEntry {
    features: FeatureSet,
    mask: Option<Vec<bool>>,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    /// Recency order, least recently used first.
    order: VecDeque<String>,
    stats: CacheStats,
}

impl CacheInner {
    fn touch(&mut self, image_name: &str) {
        if let Some(pos) = self.order.iter().position(|n| n == image_name) {
            if let Some(name) = self.order.remove(pos) {
                self.order.push_back(name);
            }
        }
    }
}

/// Bounded in-memory feature cache with LRU eviction.
pub struct FeatureCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

impl FeatureCache {
    /// Cache holding at most `capacity` images. A capacity of 0 disables
    /// retention: inserts are dropped.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            capacity,
        }
    }

    pub fn from_params(params: &FeatureCacheParams) -> Self {
        Self::with_capacity(params.capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, image_name: &str) -> bool {
        self.inner.lock().entries.contains_key(image_name)
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats
    }

    /// Store `features` for `image_name`, replacing any previous entry.
    ///
    /// `mask`, if given, must have one entry per feature. Returns the name of
    /// the entry evicted to make room, if any.
    pub fn insert(
        &self,
        image_name: impl Into<String>,
        features: FeatureSet,
        mask: Option<Vec<bool>>,
    ) -> Result<Option<String>, FeatureError> {
        if let Some(mask) = &mask {
            if mask.len() != features.len() {
                return Err(FeatureError::MaskLengthMismatch {
                    mask: mask.len(),
                    features: features.len(),
                });
            }
        }
        if self.capacity == 0 {
            return Ok(None);
        }

        let image_name = image_name.into();
        let mut inner = self.inner.lock();

        let replaced = inner
            .entries
            .insert(image_name.clone(), CacheEntry { features, mask })
            .is_some();
        if replaced {
            inner.touch(&image_name);
            return Ok(None);
        }
        inner.order.push_back(image_name);

        let mut evicted = None;
        while inner.entries.len() > self.capacity {
            let Some(oldest) = inner.order.pop_front() else { break };
            inner.entries.remove(&oldest);
            inner.stats.evictions += 1;
            debug!("Feature cache evicted {}", oldest);
            evicted = Some(oldest);
        }
        Ok(evicted)
    }

    /// Features for `image_name`, masked if requested. `None` on a miss.
    pub fn load(&self, image_name: &str, masked: bool) -> Option<FeatureSet> {
        let mut inner = self.inner.lock();

        let loaded = inner.entries.get(image_name).map(|entry| match (&entry.mask, masked) {
            (Some(mask), true) => entry.features.select(mask),
            _ => Ok(entry.features.clone()),
        });

        match loaded {
            Some(Ok(features)) => {
                inner.stats.hits += 1;
                inner.touch(image_name);
                debug!("Feature cache hit for {} ({} features)", image_name, features.len());
                Some(features)
            }
            // Mask length is checked on insert.
            Some(Err(_)) | None => {
                inner.stats.misses += 1;
                debug!("Feature cache miss for {}", image_name);
                None
            }
        }
    }

    pub fn remove(&self, image_name: &str) -> bool {
        let mut inner = self.inner.lock();
        inner.order.retain(|n| n != image_name);
        inner.entries.remove(image_name).is_some()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }
}

impl Default for FeatureCache {
    fn default() -> Self {
        Self::from_params(&FeatureCacheParams::default())
    }
}

/// A bare cache can serve cache-mode attachment; it cannot extract.
impl FeatureProvider for FeatureCache {
    fn extract(&self, image_name: &str, _image: Option<&GrayImage>) -> Option<FeatureTriple> {
        debug!("No extractor configured, cannot extract {}", image_name);
        None
    }

    fn load_cached(&self, image_name: &str, masked: bool) -> Option<FeatureTriple> {
        self.load(image_name, masked).map(FeatureSet::into_triple)
    }
}

/// Extractor paired with a shared cache. Fresh extractions are written back
/// into the cache so later cache-mode loads can find them.
pub struct CachedFeatureProvider<E> {
    extractor: E,
    cache: Arc<FeatureCache>,
}

impl<E: FeatureExtractor> CachedFeatureProvider<E> {
    pub fn new(extractor: E, cache: Arc<FeatureCache>) -> Self {
        Self { extractor, cache }
    }

    pub fn cache(&self) -> &Arc<FeatureCache> {
        &self.cache
    }
}

impl<E: FeatureExtractor> FeatureProvider for CachedFeatureProvider<E> {
    fn extract(&self, image_name: &str, image: Option<&GrayImage>) -> Option<FeatureTriple> {
        let triple = self.extractor.extract(image_name, image)?;
        // Inconsistent triples are returned as-is; the frame rejects them.
        if let Ok(features) = FeatureSet::try_from(triple.clone()) {
            if let Err(e) = self.cache.insert(image_name, features, None) {
                debug!("Not caching features of {}: {}", image_name, e);
            }
        }
        Some(triple)
    }

    fn load_cached(&self, image_name: &str, masked: bool) -> Option<FeatureTriple> {
        self.cache.load_cached(image_name, masked)
    }
}
