//! Adjustment abstractions
//!
//! An [`Adjustment`] is a named, configurable step attached to one processing
//! request. Only adjustments that expose the [`ImageAdjustment`] capability may
//! be handed to the pipeline; anything else is rejected before pixel work starts.

pub mod crop;
pub mod registry;
pub mod resize;
pub mod watermark;

pub use crop::CropAdjustment;
pub use registry::AdjustmentRegistry;
pub use resize::{RatioMode, ResizeAdjustment};
pub use watermark::{WatermarkAdjustment, WatermarkSource};

use image::DynamicImage;
use retouch_core::{Configuration, MediaResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Base contract of every adjustment kind
pub trait Adjustment: Send + Sync + fmt::Debug {
    /// Stable kind identifier, also the registry key
    fn kind(&self) -> &'static str;

    /// Declared execution rank of the kind; lower runs first
    fn priority(&self) -> u32;

    /// Caller facing position value, kept for persistence only
    fn position(&self) -> i32;

    fn configuration(&self) -> &Configuration;

    /// Capability probe for the image adjustment contract
    fn as_image_adjustment(&self) -> Option<&dyn ImageAdjustment> {
        None
    }

    fn to_record(&self) -> AdjustmentRecord {
        AdjustmentRecord {
            kind: self.kind().to_string(),
            position: self.position(),
            configuration: self.configuration().clone(),
        }
    }
}

/// Adjustments able to transform decoded pixels
pub trait ImageAdjustment: Adjustment {
    /// Whether the adjustment would change `image`. A `false` result skips it.
    fn can_be_applied(&self, image: &DynamicImage) -> bool;

    /// Consume the working image and return the transformed one
    fn apply_to_image(&self, image: DynamicImage) -> MediaResult<DynamicImage>;
}

/// Serialized form of an adjustment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentRecord {
    pub kind: String,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub configuration: Configuration,
}

impl AdjustmentRecord {
    pub fn new(kind: impl Into<String>, position: i32, configuration: Configuration) -> Self {
        Self {
            kind: kind.into(),
            position,
            configuration,
        }
    }
}

/// Read an optional non-negative pixel value from a configuration
pub(crate) fn config_dimension(
    configuration: &Configuration,
    key: &str,
) -> MediaResult<Option<u32>> {
    match configuration.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_i64()
            .and_then(|v| u32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| {
                retouch_core::MediaError::invalid_adjustment(
                    key,
                    value,
                    "must be a non-negative integer",
                )
            }),
    }
}
