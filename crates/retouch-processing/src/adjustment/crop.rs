use image::{DynamicImage, GenericImageView};
use retouch_core::{Configuration, MediaError, MediaResult};

use super::{config_dimension, Adjustment, AdjustmentRecord, ImageAdjustment};

pub const KIND: &str = "crop";
const PRIORITY: u32 = 10;
const DEFAULT_POSITION: i32 = 10;

/// Cut a rectangle out of the image
#[derive(Debug, Clone)]
pub struct CropAdjustment {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    position: i32,
    configuration: Configuration,
}

impl CropAdjustment {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> MediaResult<Self> {
        let mut configuration = Configuration::new();
        configuration.set("x", x)?;
        configuration.set("y", y)?;
        configuration.set("width", width)?;
        configuration.set("height", height)?;
        Ok(Self {
            x,
            y,
            width,
            height,
            position: DEFAULT_POSITION,
            configuration,
        })
    }

    pub fn from_record(record: &AdjustmentRecord) -> MediaResult<Self> {
        let configuration = &record.configuration;
        let field = |key: &str| -> MediaResult<u32> {
            config_dimension(configuration, key)?.ok_or_else(|| {
                MediaError::invalid_adjustment(key, "", "crop requires x, y, width and height")
            })
        };
        Ok(Self {
            x: field("x")?,
            y: field("y")?,
            width: field("width")?,
            height: field("height")?,
            position: record.position,
            configuration: configuration.clone(),
        })
    }

    pub fn with_position(mut self, position: i32) -> Self {
        self.position = position;
        self
    }
}

impl Adjustment for CropAdjustment {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn priority(&self) -> u32 {
        PRIORITY
    }

    fn position(&self) -> i32 {
        self.position
    }

    fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    fn as_image_adjustment(&self) -> Option<&dyn ImageAdjustment> {
        Some(self)
    }
}

impl ImageAdjustment for CropAdjustment {
    fn can_be_applied(&self, image: &DynamicImage) -> bool {
        let (width, height) = image.dimensions();
        if self.width == 0 || self.height == 0 || self.x >= width || self.y >= height {
            return false;
        }
        // A rectangle covering the whole image changes nothing.
        !(self.x == 0 && self.y == 0 && self.width >= width && self.height >= height)
    }

    fn apply_to_image(&self, image: DynamicImage) -> MediaResult<DynamicImage> {
        let (width, height) = image.dimensions();
        let crop_width = self.width.min(width.saturating_sub(self.x));
        let crop_height = self.height.min(height.saturating_sub(self.y));
        Ok(image.crop_imm(self.x, self.y, crop_width, crop_height))
    }
}
