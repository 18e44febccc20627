//! Image service
//!
//! Orchestrates one processing call: materialize the source, run the
//! adjustment pipeline (per frame for animations), encode only when something
//! changed, hand the result to the resource store and memoize its size.

use bytes::Bytes;
use image::{ImageFormat, ImageReader};
use retouch_core::constants::DEFAULT_COLLECTION;
use retouch_core::{Config, Configuration, ImageConfig, ImageSize, MediaError, MediaResult};
use retouch_storage::{
    create_size_cache, create_store, ImageSizeCache, Resource, ResourceStore, StoreError,
};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;

use crate::adjustment::Adjustment;
use crate::animation;
use crate::encoder::ImageEncoder;
use crate::handle::ImageHandle;
use crate::options::OutputOptions;
use crate::pipeline::AdjustmentPipeline;

/// In-memory outcome of [`ImageService::process_bytes`]
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    /// Encoded result, or the input bytes verbatim when nothing was applied
    pub data: Bytes,
    pub size: ImageSize,
    pub animated: bool,
    pub applied: bool,
}

/// Outcome of [`ImageService::process_image`]
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResult {
    pub resource: Resource,
    pub width: u32,
    pub height: u32,
    pub animated: bool,
    pub applied: bool,
}

impl ProcessingResult {
    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.width, self.height)
    }
}

/// Image processing service
#[derive(Clone)]
pub struct ImageService {
    store: Arc<dyn ResourceStore>,
    size_cache: Arc<dyn ImageSizeCache>,
    config: ImageConfig,
}

impl ImageService {
    pub fn new(
        store: Arc<dyn ResourceStore>,
        size_cache: Arc<dyn ImageSizeCache>,
        config: ImageConfig,
    ) -> Self {
        Self {
            store,
            size_cache,
            config,
        }
    }

    /// Build the service with the store and cache described by `config`
    pub async fn from_config(config: &Config) -> MediaResult<Self> {
        let store = create_store(config)
            .await
            .map_err(|e| MediaError::Internal(format!("Failed to create resource store: {}", e)))?;
        Ok(Self::new(store, create_size_cache(config), config.image.clone()))
    }

    pub fn store(&self) -> &Arc<dyn ResourceStore> {
        &self.store
    }

    pub fn config(&self) -> &ImageConfig {
        &self.config
    }

    /// Apply `adjustments` to encoded image bytes without touching the store.
    ///
    /// `format` is guessed from the bytes when not given.
    pub fn process_bytes(
        &self,
        data: &[u8],
        format: Option<ImageFormat>,
        adjustments: &[Arc<dyn Adjustment>],
        additional_options: &Configuration,
    ) -> MediaResult<ProcessedImage> {
        let pipeline = AdjustmentPipeline::new(adjustments)?;
        render(&pipeline, data, format, additional_options, &self.config)
    }

    /// Process a stored resource and import the outcome.
    ///
    /// When no adjustment applies, the original bytes are imported unchanged
    /// under the original filename. Otherwise the re-encoded image is imported
    /// as `{stem}-{width}x{height}.{ext}`.
    pub async fn process_image(
        &self,
        resource: &Resource,
        adjustments: &[Arc<dyn Adjustment>],
        additional_options: &Configuration,
    ) -> MediaResult<ProcessingResult> {
        let start = std::time::Instant::now();
        let pipeline = AdjustmentPipeline::new(adjustments)?;

        let local_copy = self
            .store
            .create_temporary_local_copy(resource)
            .await
            .map_err(|e| source_error(resource, e))?;
        let data = tokio::fs::read(&local_copy).await.map_err(|e| {
            MediaError::ImageFile(format!(
                "Could not read source image {}: {}",
                local_copy.display(),
                e
            ))
        })?;

        let format = ImageFormat::from_extension(resource.file_extension());
        let config = self.config.clone();
        let additional_options = additional_options.clone();
        let extension = resource.file_extension();

        let (processed, temporary) = tokio::task::spawn_blocking(move || {
            let processed = render(&pipeline, &data, format, &additional_options, &config)?;
            let temporary = if processed.applied {
                Some(write_temporary(
                    &processed.data,
                    &extension,
                    &config.temporary_directory,
                )?)
            } else {
                None
            };
            Ok::<_, MediaError>((processed, temporary))
        })
        .await
        .map_err(|e| MediaError::Internal(format!("Image processing task failed: {}", e)))??;

        let collection = if resource.collection.is_empty() {
            DEFAULT_COLLECTION
        } else {
            resource.collection.as_str()
        };

        let (imported, size) = match temporary {
            Some(temporary) => {
                let filename = derived_filename(&resource.filename, processed.size);
                // The temporary file is removed when `temporary` drops, on
                // either path out of this block.
                let imported = self
                    .store
                    .import_file(temporary.path(), &filename, collection)
                    .await
                    .map_err(import_error)?;
                (imported, processed.size)
            }
            None => {
                let imported = self
                    .store
                    .import(processed.data.to_vec(), &resource.filename, collection)
                    .await
                    .map_err(import_error)?;
                let size = self
                    .size_cache
                    .get(imported.cache_identity())
                    .unwrap_or(processed.size);
                (imported, size)
            }
        };

        self.size_cache.set(imported.cache_identity(), size);

        tracing::info!(
            source = %resource.key,
            result = %imported.key,
            filename = %imported.filename,
            width = size.width,
            height = size.height,
            applied = processed.applied,
            animated = processed.animated,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image processed"
        );

        Ok(ProcessingResult {
            resource: imported,
            width: size.width,
            height: size.height,
            animated: processed.animated,
            applied: processed.applied,
        })
    }

    /// Dimensions of a stored resource, from the cache when possible
    pub async fn get_image_size(&self, resource: &Resource) -> MediaResult<ImageSize> {
        if let Some(size) = self.size_cache.get(resource.cache_identity()) {
            return Ok(size);
        }

        tracing::warn!(key = %resource.key, "Image size cache miss, reading image header");

        let local_copy = self
            .store
            .create_temporary_local_copy(resource)
            .await
            .map_err(|e| source_error(resource, e))?;

        let size = tokio::task::spawn_blocking(move || read_dimensions(&local_copy))
            .await
            .map_err(|e| MediaError::Internal(format!("Image size task failed: {}", e)))??;

        self.size_cache.set(resource.cache_identity(), size);
        Ok(size)
    }
}

/// Decode, run the pipeline and encode if anything changed
fn render(
    pipeline: &AdjustmentPipeline,
    data: &[u8],
    format: Option<ImageFormat>,
    additional_options: &Configuration,
    config: &ImageConfig,
) -> MediaResult<ProcessedImage> {
    let format = match format {
        Some(format) => format,
        None => image::guess_format(data)
            .map_err(|e| MediaError::ImageFile(format!("Unknown image format: {}", e)))?,
    };
    let animated = format == ImageFormat::Gif && animation::is_animated_gif(data);

    // Options are validated before any pixel work.
    let options = OutputOptions::merged(&config.default_options, additional_options, animated)?;

    let handle = ImageHandle::open(data, Some(format))?;
    let source_size = handle.dimensions();
    let (handle, applied) = pipeline.apply_handle(handle, config.parallel_frames)?;

    if !applied {
        return Ok(ProcessedImage {
            data: Bytes::copy_from_slice(data),
            size: source_size,
            animated,
            applied: false,
        });
    }

    let encoded = ImageEncoder::encode(&handle, format, &options)?;
    Ok(ProcessedImage {
        data: encoded,
        size: handle.dimensions(),
        animated,
        applied: true,
    })
}

fn write_temporary(data: &[u8], extension: &str, directory: &Path) -> MediaResult<NamedTempFile> {
    let suffix = if extension.is_empty() {
        String::new()
    } else {
        format!(".{}", extension)
    };
    let mut file = tempfile::Builder::new()
        .prefix("ProcessedImage-")
        .suffix(&suffix)
        .tempfile_in(directory)
        .map_err(|e| {
            MediaError::Internal(format!(
                "Failed to create temporary file in {}: {}",
                directory.display(),
                e
            ))
        })?;
    file.write_all(data)
        .and_then(|_| file.flush())
        .map_err(|e| MediaError::Internal(format!("Failed to write temporary file: {}", e)))?;
    Ok(file)
}

fn read_dimensions(path: &Path) -> MediaResult<ImageSize> {
    let (width, height) = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| MediaError::ImageFile(format!("Could not open {}: {}", path.display(), e)))?
        .into_dimensions()
        .map_err(|e| {
            MediaError::ImageFile(format!("Could not read size of {}: {}", path.display(), e))
        })?;
    Ok(ImageSize::new(width, height))
}

/// `{stem}-{width}x{height}.{ext}`, or `{filename}-{width}x{height}` without extension
pub fn derived_filename(filename: &str, size: ImageSize) -> String {
    let path = Path::new(filename);
    match (
        path.file_stem().and_then(|s| s.to_str()),
        path.extension().and_then(|e| e.to_str()),
    ) {
        (Some(stem), Some(extension)) => {
            format!("{}-{}x{}.{}", stem, size.width, size.height, extension)
        }
        _ => format!("{}-{}x{}", filename, size.width, size.height),
    }
}

fn source_error(resource: &Resource, err: StoreError) -> MediaError {
    MediaError::ImageFile(format!(
        "Could not materialize resource {} ({}): {}",
        resource.key, resource.filename, err
    ))
}

fn import_error(err: StoreError) -> MediaError {
    MediaError::ImportFailure(format!("Could not import processed image: {}", err))
}
