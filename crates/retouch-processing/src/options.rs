//! Output options
//!
//! Effective encoder settings for one call: the configured default options
//! merged with the per-call options, plus the derived quality values.

use retouch_core::constants::{DEFAULT_IMAGE_QUALITY, MAX_COMPRESSION_LEVEL};
use retouch_core::{ConfigValue, Configuration, MediaError, MediaResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOptions {
    /// Lossy quality, 0..=100
    pub quality: u8,
    /// Lossless compression level derived from `quality`, 0..=9
    pub compression_level: u8,
    /// Output is a multi-frame animation
    pub animated: bool,
    merged: Configuration,
}

impl OutputOptions {
    /// Merge `additional` over `defaults` (per-call values win) and validate.
    pub fn merged(
        defaults: &Configuration,
        additional: &Configuration,
        animated: bool,
    ) -> MediaResult<Self> {
        let mut merged = defaults.merge_overrule(additional);

        let quality = match merged.get("quality") {
            None => DEFAULT_IMAGE_QUALITY,
            Some(ConfigValue::Integer(q)) => *q,
            Some(ConfigValue::String(s)) => s.trim().parse().map_err(|_| invalid_quality(s))?,
            Some(other) => return Err(invalid_quality(other)),
        };
        if !(0..=100).contains(&quality) {
            return Err(invalid_quality(quality));
        }
        let quality = quality as u8;
        let compression_level = compression_level_for(quality);

        merged.set("quality", quality as i64)?;
        merged.set("jpeg_quality", quality as i64)?;
        merged.set("png_compression_level", compression_level as i64)?;
        if animated {
            merged.set("animated", true)?;
        }

        Ok(Self {
            quality,
            compression_level,
            animated,
            merged,
        })
    }

    /// The merged option tree, including the derived keys
    pub fn configuration(&self) -> &Configuration {
        &self.merged
    }
}

fn invalid_quality(value: impl ToString) -> MediaError {
    MediaError::InvalidConfiguration(format!(
        "The quality option allows only values between 0 and 100, current value: {}",
        value.to_string()
    ))
}

/// `ceil(9 - quality * 9 / 100)` for a quality in 0..=100
pub fn compression_level_for(quality: u8) -> u8 {
    let quality = quality.min(100) as u32;
    let max = MAX_COMPRESSION_LEVEL as u32;
    // 9 - floor(9q/100) == ceil(9 - 9q/100)
    (max - (max * quality) / 100) as u8
}
