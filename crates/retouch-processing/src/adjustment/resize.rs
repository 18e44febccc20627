use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use retouch_core::{Configuration, MediaError, MediaResult};
use std::str::FromStr;

use super::{config_dimension, Adjustment, AdjustmentRecord, ImageAdjustment};

pub const KIND: &str = "resize";
const PRIORITY: u32 = 20;
const DEFAULT_POSITION: i32 = 20;

/// How a width/height box is honoured when both sides are given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RatioMode {
    /// Fit inside the box, keeping the aspect ratio
    #[default]
    Inset,
    /// Fill the box and crop the overflow
    Outbound,
}

impl RatioMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RatioMode::Inset => "inset",
            RatioMode::Outbound => "outbound",
        }
    }
}

impl FromStr for RatioMode {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inset" => Ok(RatioMode::Inset),
            "outbound" => Ok(RatioMode::Outbound),
            other => Err(MediaError::invalid_adjustment(
                "ratioMode",
                other,
                "must be one of inset, outbound",
            )),
        }
    }
}

/// Scale the image to requested and/or maximum dimensions
#[derive(Debug, Clone)]
pub struct ResizeAdjustment {
    width: Option<u32>,
    height: Option<u32>,
    maximum_width: Option<u32>,
    maximum_height: Option<u32>,
    ratio_mode: RatioMode,
    allow_up_scaling: bool,
    position: i32,
    configuration: Configuration,
}

impl ResizeAdjustment {
    pub fn new() -> Self {
        Self {
            width: None,
            height: None,
            maximum_width: None,
            maximum_height: None,
            ratio_mode: RatioMode::Inset,
            allow_up_scaling: false,
            position: DEFAULT_POSITION,
            configuration: Configuration::new(),
        }
    }

    pub fn from_record(record: &AdjustmentRecord) -> MediaResult<Self> {
        let configuration = &record.configuration;
        let ratio_mode = match configuration.get("ratioMode") {
            None => RatioMode::Inset,
            Some(value) => value
                .as_str()
                .ok_or_else(|| {
                    MediaError::invalid_adjustment("ratioMode", value, "must be a string")
                })?
                .parse()?,
        };
        let allow_up_scaling = match configuration.get("allowUpScaling") {
            None => false,
            Some(value) => value.as_bool().ok_or_else(|| {
                MediaError::invalid_adjustment("allowUpScaling", value, "must be a boolean")
            })?,
        };

        Ok(Self {
            width: non_zero(config_dimension(configuration, "width")?),
            height: non_zero(config_dimension(configuration, "height")?),
            maximum_width: non_zero(config_dimension(configuration, "maximumWidth")?),
            maximum_height: non_zero(config_dimension(configuration, "maximumHeight")?),
            ratio_mode,
            allow_up_scaling,
            position: record.position,
            configuration: configuration.clone(),
        })
    }

    pub fn set_width(&mut self, width: u32) -> MediaResult<()> {
        self.configuration.set("width", width)?;
        self.width = non_zero(Some(width));
        Ok(())
    }

    pub fn set_height(&mut self, height: u32) -> MediaResult<()> {
        self.configuration.set("height", height)?;
        self.height = non_zero(Some(height));
        Ok(())
    }

    pub fn set_maximum_width(&mut self, width: u32) -> MediaResult<()> {
        self.configuration.set("maximumWidth", width)?;
        self.maximum_width = non_zero(Some(width));
        Ok(())
    }

    pub fn set_maximum_height(&mut self, height: u32) -> MediaResult<()> {
        self.configuration.set("maximumHeight", height)?;
        self.maximum_height = non_zero(Some(height));
        Ok(())
    }

    pub fn set_ratio_mode(&mut self, mode: &str) -> MediaResult<()> {
        let parsed: RatioMode = mode.parse()?;
        self.configuration.set("ratioMode", parsed.as_str())?;
        self.ratio_mode = parsed;
        Ok(())
    }

    pub fn set_allow_up_scaling(&mut self, allow: bool) -> MediaResult<()> {
        self.configuration.set("allowUpScaling", allow)?;
        self.allow_up_scaling = allow;
        Ok(())
    }

    fn fills_box(&self) -> bool {
        self.ratio_mode == RatioMode::Outbound && self.width.is_some() && self.height.is_some()
    }

    /// Final dimensions for an image of `width`×`height`
    pub fn target_size(&self, width: u32, height: u32) -> (u32, u32) {
        let (mut target_width, mut target_height) = match (self.width, self.height) {
            (Some(w), Some(h)) if self.fills_box() => (w, h),
            (Some(w), Some(h)) => fit(width, height, w, h),
            (Some(w), None) => (w, scale(height, w, width)),
            (None, Some(h)) => (scale(width, h, height), h),
            (None, None) => (width, height),
        };

        if let Some(max_width) = self.maximum_width {
            if target_width > max_width {
                target_height = scale(target_height, max_width, target_width);
                target_width = max_width;
            }
        }
        if let Some(max_height) = self.maximum_height {
            if target_height > max_height {
                target_width = scale(target_width, max_height, target_height);
                target_height = max_height;
            }
        }

        if !self.allow_up_scaling && (target_width > width || target_height > height) {
            if self.fills_box() {
                target_width = target_width.min(width);
                target_height = target_height.min(height);
            } else {
                (target_width, target_height) = fit(target_width, target_height, width, height);
            }
        }

        (target_width.max(1), target_height.max(1))
    }
}

impl Default for ResizeAdjustment {
    fn default() -> Self {
        Self::new()
    }
}

fn non_zero(value: Option<u32>) -> Option<u32> {
    value.filter(|v| *v > 0)
}

/// `value * numerator / denominator`, rounded, at least 1
fn scale(value: u32, numerator: u32, denominator: u32) -> u32 {
    if denominator == 0 {
        return value.max(1);
    }
    let scaled = (value as f64 * numerator as f64 / denominator as f64).round();
    (scaled as u32).max(1)
}

/// Largest size with the aspect ratio of `width`×`height` inside `box_width`×`box_height`
fn fit(width: u32, height: u32, box_width: u32, box_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (box_width, box_height);
    }
    let ratio = (box_width as f64 / width as f64).min(box_height as f64 / height as f64);
    (
        ((width as f64 * ratio).round() as u32).clamp(1, box_width.max(1)),
        ((height as f64 * ratio).round() as u32).clamp(1, box_height.max(1)),
    )
}

impl Adjustment for ResizeAdjustment {
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

impl ImageAdjustment for ResizeAdjustment {
    fn can_be_applied(&self, image: &DynamicImage) -> bool {
        let (width, height) = image.dimensions();
        self.target_size(width, height) != (width, height)
    }

    fn apply_to_image(&self, image: DynamicImage) -> MediaResult<DynamicImage> {
        let (width, height) = image.dimensions();
        let (target_width, target_height) = self.target_size(width, height);
        let resized = if self.fills_box() {
            image.resize_to_fill(target_width, target_height, FilterType::Lanczos3)
        } else {
            image.resize_exact(target_width, target_height, FilterType::Lanczos3)
        };
        Ok(resized)
    }
}
