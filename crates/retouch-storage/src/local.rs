use crate::keys::{content_hash, generate_resource_key};
use crate::traits::{Resource, ResourceStore, StoreError, StoreResult};
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local filesystem resource store
#[derive(Clone, Debug)]
pub struct LocalResourceStore {
    base_path: PathBuf,
}

impl LocalResourceStore {
    /// Create a new LocalResourceStore rooted at `base_path`
    pub async fn new(base_path: impl Into<PathBuf>) -> StoreResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StoreError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalResourceStore { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert a resource key to a filesystem path, rejecting keys that could
    /// escape the base directory.
    fn key_to_path(&self, key: &str) -> StoreResult<PathBuf> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') || key.contains('\\') {
            return Err(StoreError::InvalidKey(
                "Resource key contains invalid characters".to_string(),
            ));
        }
        Ok(self.base_path.join(key))
    }

    /// Local copies live in `tmp/` and are keyed by content hash and extension,
    /// so the directory is a cache holding at most one copy per stored
    /// resource. Use [`LocalResourceStore::clear_temporary_copies`] to evict it.
    fn temporary_path(&self, resource: &Resource) -> StoreResult<PathBuf> {
        let extension = resource.file_extension();
        let name = if extension.is_empty() {
            resource.content_hash.clone()
        } else {
            format!("{}.{}", resource.content_hash, extension)
        };
        self.key_to_path(&format!("tmp/{}", name))
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StoreResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn write_content(&self, key: &str, data: Vec<u8>) -> StoreResult<PathBuf> {
        let path = self.key_to_path(key)?;
        if has_length(&path, data.len() as u64).await {
            return Ok(path);
        }

        self.ensure_parent_dir(&path).await?;
        persist_atomically(path.clone(), data)
            .await
            .map_err(|e| {
                StoreError::ImportFailed(format!("Failed to write file {}: {}", path.display(), e))
            })?;

        Ok(path)
    }

    /// Remove every temporary local copy. Returns the number of files removed.
    pub async fn clear_temporary_copies(&self) -> StoreResult<usize> {
        let dir = self.base_path.join("tmp");
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }

        tracing::debug!(path = %dir.display(), removed, "Cleared temporary local copies");
        Ok(removed)
    }
}

/// An existing file with the expected length is complete: every write goes
/// through [`persist_atomically`], so only leftovers from elsewhere can differ.
async fn has_length(path: &Path, expected: u64) -> bool {
    matches!(fs::metadata(path).await, Ok(meta) if meta.is_file() && meta.len() == expected)
}

/// Write into a temporary file next to `path` and rename it into place, so
/// readers never observe a partially written file.
async fn persist_atomically(path: PathBuf, data: Vec<u8>) -> std::io::Result<()> {
    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(&data)?;
        file.as_file().sync_all()?;
        file.persist(&path).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(std::io::Error::other)?
}

#[async_trait]
impl ResourceStore for LocalResourceStore {
    async fn import(
        &self,
        data: Vec<u8>,
        filename: &str,
        collection: &str,
    ) -> StoreResult<Resource> {
        let start = std::time::Instant::now();
        let hash = content_hash(&data);
        let key = generate_resource_key(&hash);
        let size_bytes = data.len() as u64;
        let path = self.write_content(&key, data).await?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            collection = %collection,
            size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local resource import successful"
        );

        Ok(Resource {
            key,
            content_hash: hash,
            filename: filename.to_string(),
            collection: collection.to_string(),
            size_bytes,
        })
    }

    async fn import_file(
        &self,
        path: &Path,
        filename: &str,
        collection: &str,
    ) -> StoreResult<Resource> {
        let data = fs::read(path).await.map_err(|e| {
            StoreError::ImportFailed(format!("Failed to read file {}: {}", path.display(), e))
        })?;
        self.import(data, filename, collection).await
    }

    async fn create_temporary_local_copy(&self, resource: &Resource) -> StoreResult<PathBuf> {
        let source = self.key_to_path(&resource.key)?;
        if !fs::try_exists(&source).await.unwrap_or(false) {
            return Err(StoreError::NotFound(resource.key.clone()));
        }

        let target = self.temporary_path(resource)?;
        let source_len = fs::metadata(&source).await?.len();
        if !has_length(&target, source_len).await {
            let data = fs::read(&source).await.map_err(|e| {
                StoreError::ReadFailed(format!("Failed to read {}: {}", source.display(), e))
            })?;
            self.ensure_parent_dir(&target).await?;
            persist_atomically(target.clone(), data).await.map_err(|e| {
                StoreError::ReadFailed(format!(
                    "Failed to copy {} to {}: {}",
                    source.display(),
                    target.display(),
                    e
                ))
            })?;
            tracing::debug!(key = %resource.key, path = %target.display(), "Created temporary local copy");
        }

        Ok(target)
    }

    async fn read(&self, resource: &Resource) -> StoreResult<Vec<u8>> {
        let path = self.key_to_path(&resource.key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StoreError::NotFound(resource.key.clone()));
        }

        fs::read(&path).await.map_err(|e| {
            StoreError::ReadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })
    }

    async fn exists(&self, resource: &Resource) -> StoreResult<bool> {
        let path = self.key_to_path(&resource.key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }
}
