//! Test helpers: build an ImageService over a temporary local store.
//!
//! Run from workspace root: `cargo test -p retouch-processing --test service_test`.

#![allow(dead_code)]

pub mod fixtures;

use async_trait::async_trait;
use retouch_core::ImageConfig;
use retouch_processing::ImageService;
use retouch_storage::{
    ImageSizeCache, LocalResourceStore, LruSizeCache, Resource, ResourceStore, StoreError,
    StoreResult,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Service plus the directories it writes to
pub struct TestService {
    pub service: ImageService,
    pub store: Arc<LocalResourceStore>,
    pub size_cache: Arc<LruSizeCache>,
    pub temp_dir: PathBuf,
    pub _root: TempDir,
}

impl TestService {
    /// Import `data` as a source resource
    pub async fn import(&self, data: Vec<u8>, filename: &str) -> Resource {
        self.store
            .import(data, filename, "persistent")
            .await
            .expect("import fixture")
    }

    /// Files left behind in the service's temporary directory
    pub fn leftover_temporary_files(&self) -> Vec<PathBuf> {
        std::fs::read_dir(&self.temp_dir)
            .expect("read temp dir")
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect()
    }
}

pub async fn setup_test_service() -> TestService {
    setup_test_service_with(|_| {}).await
}

pub async fn setup_test_service_with(configure: impl FnOnce(&mut ImageConfig)) -> TestService {
    let root = tempfile::tempdir().expect("create temp dir");
    let temp_dir = root.path().join("tmp");
    std::fs::create_dir_all(&temp_dir).expect("create service temp dir");

    let store = Arc::new(
        LocalResourceStore::new(root.path().join("resources"))
            .await
            .expect("create store"),
    );
    let size_cache = Arc::new(LruSizeCache::new(64));

    let mut config = ImageConfig {
        temporary_directory: temp_dir.clone(),
        ..ImageConfig::default()
    };
    configure(&mut config);

    let service = ImageService::new(
        store.clone() as Arc<dyn ResourceStore>,
        size_cache.clone() as Arc<dyn ImageSizeCache>,
        config,
    );

    TestService {
        service,
        store,
        size_cache,
        temp_dir,
        _root: root,
    }
}

/// Store that serves sources from an inner store but refuses every import
pub struct RefusingStore {
    pub inner: Arc<LocalResourceStore>,
}

#[async_trait]
impl ResourceStore for RefusingStore {
    async fn import(
        &self,
        _data: Vec<u8>,
        _filename: &str,
        _collection: &str,
    ) -> StoreResult<Resource> {
        Err(StoreError::ImportFailed("store is read-only".to_string()))
    }

    async fn import_file(
        &self,
        _path: &Path,
        _filename: &str,
        _collection: &str,
    ) -> StoreResult<Resource> {
        Err(StoreError::ImportFailed("store is read-only".to_string()))
    }

    async fn create_temporary_local_copy(&self, resource: &Resource) -> StoreResult<PathBuf> {
        self.inner.create_temporary_local_copy(resource).await
    }

    async fn read(&self, resource: &Resource) -> StoreResult<Vec<u8>> {
        self.inner.read(resource).await
    }

    async fn exists(&self, resource: &Resource) -> StoreResult<bool> {
        self.inner.exists(resource).await
    }
}
