//! Image size cache
//!
//! Decoding an image just to learn its dimensions is expensive, so sizes are
//! memoized by resource identity. The value is a pure function of immutable
//! resource bytes, which makes `set` an idempotent upsert where the last
//! writer wins.

use lru::LruCache;
use retouch_core::ImageSize;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

/// Key/value store of image dimensions by resource identity
pub trait ImageSizeCache: Send + Sync {
    fn get(&self, identity: &str) -> Option<ImageSize>;

    fn set(&self, identity: &str, size: ImageSize);
}

/// In-process, bounded [`ImageSizeCache`]
pub struct LruSizeCache {
    entries: Mutex<LruCache<String, ImageSize>>,
}

impl LruSizeCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, ImageSize>> {
        // Entries are plain values, a panic mid-update cannot leave them torn.
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl ImageSizeCache for LruSizeCache {
    fn get(&self, identity: &str) -> Option<ImageSize> {
        self.lock().get(identity).copied()
    }

    fn set(&self, identity: &str, size: ImageSize) {
        self.lock().put(identity.to_string(), size);
    }
}
