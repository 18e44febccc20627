//! Registry mapping adjustment kinds to constructors

use retouch_core::{MediaError, MediaResult};
use std::collections::HashMap;
use std::sync::Arc;

use super::{crop, resize, watermark, Adjustment, AdjustmentRecord};
use super::{CropAdjustment, ResizeAdjustment, WatermarkAdjustment};

/// Builds an adjustment from its stored record
pub type AdjustmentFactory = fn(&AdjustmentRecord) -> MediaResult<Arc<dyn Adjustment>>;

/// Kind → constructor table. New kinds are registered here without touching
/// the pipeline.
#[derive(Clone)]
pub struct AdjustmentRegistry {
    factories: HashMap<String, AdjustmentFactory>,
}

impl AdjustmentRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with the built-in crop, resize and watermark kinds
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(crop::KIND, build_crop);
        registry.register(resize::KIND, build_resize);
        registry.register(watermark::KIND, build_watermark);
        registry
    }

    /// Register (or replace) the constructor for `kind`
    pub fn register(&mut self, kind: impl Into<String>, factory: AdjustmentFactory) {
        self.factories.insert(kind.into(), factory);
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered kinds, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    pub fn build(&self, record: &AdjustmentRecord) -> MediaResult<Arc<dyn Adjustment>> {
        let factory = self.factories.get(&record.kind).ok_or_else(|| {
            MediaError::AdjustmentContractViolation(format!(
                "Unknown adjustment kind '{}'",
                record.kind
            ))
        })?;
        factory(record)
    }

    pub fn build_all(&self, records: &[AdjustmentRecord]) -> MediaResult<Vec<Arc<dyn Adjustment>>> {
        records.iter().map(|record| self.build(record)).collect()
    }
}

fn build_crop(record: &AdjustmentRecord) -> MediaResult<Arc<dyn Adjustment>> {
    Ok(Arc::new(CropAdjustment::from_record(record)?))
}

fn build_resize(record: &AdjustmentRecord) -> MediaResult<Arc<dyn Adjustment>> {
    Ok(Arc::new(ResizeAdjustment::from_record(record)?))
}

fn build_watermark(record: &AdjustmentRecord) -> MediaResult<Arc<dyn Adjustment>> {
    Ok(Arc::new(WatermarkAdjustment::from_record(record)?))
}

impl Default for AdjustmentRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
