use image::{imageops, DynamicImage, GenericImageView};
use retouch_core::{ConfigValue, Configuration, ImageSize, MediaError, MediaResult};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use super::{Adjustment, AdjustmentRecord, ImageAdjustment};
use crate::position::{HorizontalAnchor, PositionResolver, VerticalAnchor};

pub const KIND: &str = "watermark";
const PRIORITY: u32 = 30;
const DEFAULT_POSITION: i32 = 30;

/// Where a watermark overlay comes from
#[derive(Debug, Clone)]
pub enum WatermarkSource {
    /// Already decoded image
    Image(DynamicImage),
    /// Image file on the local filesystem
    Path(PathBuf),
    /// Encoded image bytes
    Bytes(Vec<u8>),
}

impl WatermarkSource {
    fn kind(&self) -> &'static str {
        match self {
            WatermarkSource::Image(_) => "image",
            WatermarkSource::Path(_) => "path",
            WatermarkSource::Bytes(_) => "bytes",
        }
    }

    /// Decode into an overlay plus the reference recorded in the configuration
    fn decode(self) -> MediaResult<(DynamicImage, String)> {
        match self {
            WatermarkSource::Image(image) => {
                let reference = hex::encode(Sha256::digest(image.as_bytes()));
                Ok((image, reference))
            }
            WatermarkSource::Path(path) => {
                let image = image::open(&path).map_err(|e| {
                    MediaError::invalid_adjustment(
                        "watermark",
                        path.display(),
                        format!("cannot decode overlay: {}", e),
                    )
                })?;
                Ok((image, path.display().to_string()))
            }
            WatermarkSource::Bytes(bytes) => {
                let reference = hex::encode(Sha256::digest(&bytes));
                let image = image::load_from_memory(&bytes).map_err(|e| {
                    MediaError::invalid_adjustment(
                        "watermark",
                        format!("{} bytes", bytes.len()),
                        format!("cannot decode overlay: {}", e),
                    )
                })?;
                Ok((image, reference))
            }
        }
    }
}

/// Paste an overlay image at an anchored position
#[derive(Debug, Clone)]
pub struct WatermarkAdjustment {
    overlay: Option<Arc<DynamicImage>>,
    vertical: VerticalAnchor,
    horizontal: HorizontalAnchor,
    vertical_offset: i64,
    horizontal_offset: i64,
    position: i32,
    configuration: Configuration,
}

impl WatermarkAdjustment {
    pub fn new() -> Self {
        Self {
            overlay: None,
            vertical: VerticalAnchor::Top,
            horizontal: HorizontalAnchor::Left,
            vertical_offset: 0,
            horizontal_offset: 0,
            position: DEFAULT_POSITION,
            configuration: default_configuration(),
        }
    }

    /// Rebuild from a stored record. Only path sources can be reloaded; other
    /// sources leave the adjustment without an overlay until one is set.
    pub fn from_record(record: &AdjustmentRecord) -> MediaResult<Self> {
        let configuration = &record.configuration;
        let mut adjustment = Self::new();
        adjustment.position = record.position;

        if let Some(value) = configuration.get("verticalPosition") {
            adjustment.vertical = anchor_value::<VerticalAnchor>("verticalPosition", value)?;
        }
        if let Some(value) = configuration.get("horizontalPosition") {
            adjustment.horizontal = anchor_value::<HorizontalAnchor>("horizontalPosition", value)?;
        }
        if let Some(value) = configuration.get("verticalOffset") {
            adjustment.vertical_offset = offset_value("verticalOffset", value)?;
        }
        if let Some(value) = configuration.get("horizontalOffset") {
            adjustment.horizontal_offset = offset_value("horizontalOffset", value)?;
        }

        if configuration.get_str("watermark.source") == Some("path") {
            if let Some(reference) = configuration.get_str("watermark.reference") {
                let (overlay, _) = WatermarkSource::Path(PathBuf::from(reference)).decode()?;
                adjustment.overlay = Some(Arc::new(overlay));
            }
        }

        adjustment.configuration = adjustment.configuration.merge_overrule(configuration);
        Ok(adjustment)
    }

    pub fn with_position(mut self, position: i32) -> Self {
        self.position = position;
        self
    }

    /// Set the overlay. The source is decoded before anything is stored, so a
    /// failed decode leaves the adjustment unchanged.
    pub fn set_watermark(&mut self, source: WatermarkSource) -> MediaResult<()> {
        let source_kind = source.kind();
        let (overlay, reference) = source.decode()?;

        let mut configuration = self.configuration.clone();
        configuration.set("watermark.source", source_kind)?;
        configuration.set("watermark.reference", reference)?;

        self.configuration = configuration;
        self.overlay = Some(Arc::new(overlay));
        Ok(())
    }

    pub fn watermark(&self) -> Option<&DynamicImage> {
        self.overlay.as_deref()
    }

    pub fn set_vertical_position(&mut self, value: &str) -> MediaResult<()> {
        let anchor: VerticalAnchor = value.parse()?;
        self.configuration.set("verticalPosition", anchor.as_str())?;
        self.vertical = anchor;
        Ok(())
    }

    pub fn set_horizontal_position(&mut self, value: &str) -> MediaResult<()> {
        let anchor: HorizontalAnchor = value.parse()?;
        self.configuration.set("horizontalPosition", anchor.as_str())?;
        self.horizontal = anchor;
        Ok(())
    }

    pub fn set_vertical_offset(&mut self, offset: i64) -> MediaResult<()> {
        self.configuration.set("verticalOffset", offset)?;
        self.vertical_offset = offset;
        Ok(())
    }

    pub fn set_horizontal_offset(&mut self, offset: i64) -> MediaResult<()> {
        self.configuration.set("horizontalOffset", offset)?;
        self.horizontal_offset = offset;
        Ok(())
    }

    pub fn vertical_position(&self) -> VerticalAnchor {
        self.vertical
    }

    pub fn horizontal_position(&self) -> HorizontalAnchor {
        self.horizontal
    }
}

impl Default for WatermarkAdjustment {
    fn default() -> Self {
        Self::new()
    }
}

fn default_configuration() -> Configuration {
    Configuration::from_map(BTreeMap::from([
        (
            "verticalPosition".to_string(),
            ConfigValue::from(VerticalAnchor::Top.as_str()),
        ),
        ("verticalOffset".to_string(), ConfigValue::from(0i64)),
        (
            "horizontalPosition".to_string(),
            ConfigValue::from(HorizontalAnchor::Left.as_str()),
        ),
        ("horizontalOffset".to_string(), ConfigValue::from(0i64)),
    ]))
}

fn anchor_value<A>(field: &str, value: &ConfigValue) -> MediaResult<A>
where
    A: std::str::FromStr<Err = MediaError>,
{
    value
        .as_str()
        .ok_or_else(|| MediaError::invalid_adjustment(field, value, "must be a string"))?
        .parse()
}

fn offset_value(field: &str, value: &ConfigValue) -> MediaResult<i64> {
    value
        .as_i64()
        .ok_or_else(|| MediaError::invalid_adjustment(field, value, "must be an integer"))
}

impl Adjustment for WatermarkAdjustment {
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

impl ImageAdjustment for WatermarkAdjustment {
    fn can_be_applied(&self, _image: &DynamicImage) -> bool {
        self.overlay.is_some()
    }

    fn apply_to_image(&self, mut image: DynamicImage) -> MediaResult<DynamicImage> {
        let Some(overlay) = self.overlay.as_deref() else {
            return Ok(image);
        };

        let target = PositionResolver::resolve_anchored(
            ImageSize::from(image.dimensions()),
            ImageSize::from(overlay.dimensions()),
            self.horizontal,
            self.horizontal_offset,
            self.vertical,
            self.vertical_offset,
        );

        tracing::debug!(x = target.x, y = target.y, "Pasting watermark overlay");

        // Pixels are converted into the base image's color type on write.
        imageops::overlay(&mut image, overlay, target.x, target.y);
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn base(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([255, 255, 255])))
    }

    fn red_overlay(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 255])))
    }

    fn png_bytes(image: &DynamicImage) -> Vec<u8> {
        let mut buffer = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn test_defaults() {
        let adjustment = WatermarkAdjustment::new();
        assert_eq!(adjustment.position(), 30);
        assert_eq!(adjustment.vertical_position(), VerticalAnchor::Top);
        assert_eq!(adjustment.horizontal_position(), HorizontalAnchor::Left);
        assert_eq!(adjustment.configuration().get_str("verticalPosition"), Some("top"));
        assert_eq!(adjustment.configuration().get_i64("horizontalOffset"), Some(0));
        assert!(!adjustment.can_be_applied(&base(10, 10)));
    }

    #[test]
    fn test_applicable_once_overlay_is_set() {
        let mut adjustment = WatermarkAdjustment::new();
        adjustment
            .set_watermark(WatermarkSource::Image(red_overlay(4, 4)))
            .unwrap();
        assert!(adjustment.can_be_applied(&base(10, 10)));
        assert_eq!(adjustment.configuration().get_str("watermark.source"), Some("image"));
    }

    #[test]
    fn test_bottom_right_placement() {
        let mut adjustment = WatermarkAdjustment::new();
        adjustment
            .set_watermark(WatermarkSource::Bytes(png_bytes(&red_overlay(20, 10))))
            .unwrap();
        adjustment.set_vertical_position("bottom").unwrap();
        adjustment.set_horizontal_position("right").unwrap();
        adjustment.set_horizontal_offset(-2).unwrap();
        adjustment.set_vertical_offset(-3).unwrap();

        let result = adjustment.apply_to_image(base(200, 100)).unwrap().to_rgb8();
        assert_eq!(result.dimensions(), (200, 100));
        assert_eq!(result.get_pixel(178, 87), &Rgb([255, 0, 0]));
        assert_eq!(result.get_pixel(197, 96), &Rgb([255, 0, 0]));
        assert_eq!(result.get_pixel(177, 87), &Rgb([255, 255, 255]));
        assert_eq!(result.get_pixel(198, 97), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_overlay_outside_bounds_is_clipped() {
        let mut adjustment = WatermarkAdjustment::new();
        adjustment
            .set_watermark(WatermarkSource::Image(red_overlay(10, 10)))
            .unwrap();
        adjustment.set_horizontal_offset(-5).unwrap();
        adjustment.set_vertical_offset(-5).unwrap();

        let result = adjustment.apply_to_image(base(20, 20)).unwrap().to_rgb8();
        assert_eq!(result.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(result.get_pixel(4, 4), &Rgb([255, 0, 0]));
        assert_eq!(result.get_pixel(5, 5), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_keeps_base_color_type() {
        let mut adjustment = WatermarkAdjustment::new();
        adjustment
            .set_watermark(WatermarkSource::Image(red_overlay(2, 2)))
            .unwrap();
        let result = adjustment.apply_to_image(base(8, 8)).unwrap();
        assert!(matches!(result, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn test_invalid_anchor_leaves_state_untouched() {
        let mut adjustment = WatermarkAdjustment::new();
        let before = adjustment.configuration().clone();

        let err = adjustment.set_vertical_position("foo").unwrap_err();
        assert!(matches!(
            err,
            MediaError::InvalidAdjustmentConfiguration { ref field, ref value, .. }
                if field == "verticalPosition" && value == "foo"
        ));
        assert!(adjustment.set_horizontal_position("foo").is_err());
        assert_eq!(adjustment.configuration(), &before);
        assert_eq!(adjustment.vertical_position(), VerticalAnchor::Top);
    }

    #[test]
    fn test_undecodable_source_leaves_state_untouched() {
        let mut adjustment = WatermarkAdjustment::new();
        let before = adjustment.configuration().hash().to_string();

        let err = adjustment
            .set_watermark(WatermarkSource::Bytes(b"not an image".to_vec()))
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidAdjustmentConfiguration { .. }));
        assert!(adjustment
            .set_watermark(WatermarkSource::Path(PathBuf::from("/nonexistent/logo.png")))
            .is_err());
        assert!(adjustment.watermark().is_none());
        assert_eq!(adjustment.configuration().hash(), before);
    }

    #[test]
    fn test_different_overlays_hash_differently() {
        let mut a = WatermarkAdjustment::new();
        a.set_watermark(WatermarkSource::Image(red_overlay(2, 2))).unwrap();
        let mut b = WatermarkAdjustment::new();
        b.set_watermark(WatermarkSource::Image(red_overlay(3, 3))).unwrap();
        assert_ne!(a.configuration().hash(), b.configuration().hash());
    }

    #[test]
    fn test_record_with_path_source_reloads_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        red_overlay(3, 3).save(&path).unwrap();

        let mut adjustment = WatermarkAdjustment::new().with_position(5);
        adjustment.set_watermark(WatermarkSource::Path(path)).unwrap();
        adjustment.set_horizontal_position("center").unwrap();

        let restored = WatermarkAdjustment::from_record(&adjustment.to_record()).unwrap();
        assert_eq!(restored.position(), 5);
        assert_eq!(restored.horizontal_position(), HorizontalAnchor::Center);
        assert_eq!(restored.watermark().map(|o| o.dimensions()), Some((3, 3)));
        assert_eq!(restored.configuration().hash(), adjustment.configuration().hash());
    }

    #[test]
    fn test_partial_record_keeps_defaults() {
        let record = AdjustmentRecord::new(
            KIND,
            30,
            Configuration::from_json_str(r#"{"verticalPosition": "bottom"}"#).unwrap(),
        );
        let restored = WatermarkAdjustment::from_record(&record).unwrap();

        let mut built = WatermarkAdjustment::new();
        built.set_vertical_position("bottom").unwrap();

        assert_eq!(restored.vertical_position(), VerticalAnchor::Bottom);
        assert_eq!(restored.configuration().get_str("horizontalPosition"), Some("left"));
        assert_eq!(restored.configuration().get_i64("verticalOffset"), Some(0));
        assert_eq!(restored.configuration().hash(), built.configuration().hash());
    }

    #[test]
    fn test_record_with_bad_anchor_rejected() {
        let record = AdjustmentRecord::new(
            KIND,
            30,
            Configuration::from_json_str(r#"{"verticalPosition": "sideways"}"#).unwrap(),
        );
        assert!(WatermarkAdjustment::from_record(&record).is_err());
    }
}
