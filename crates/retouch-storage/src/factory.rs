use crate::{ImageSizeCache, LocalResourceStore, LruSizeCache, ResourceStore, StoreResult};
use retouch_core::Config;
use std::sync::Arc;

/// Create the resource store described by the configuration
pub async fn create_store(config: &Config) -> StoreResult<Arc<dyn ResourceStore>> {
    let store = LocalResourceStore::new(config.storage_path().clone()).await?;
    tracing::debug!(path = %store.base_path().display(), "Using local resource store");
    Ok(Arc::new(store))
}

/// Create the image size cache described by the configuration
pub fn create_size_cache(config: &Config) -> Arc<dyn ImageSizeCache> {
    Arc::new(LruSizeCache::new(config.image.size_cache_capacity))
}
