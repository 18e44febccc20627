use anyhow::{anyhow, Context};
use clap::Args;
use retouch_core::Configuration;
use retouch_processing::{
    Adjustment, CropAdjustment, ResizeAdjustment, WatermarkAdjustment, WatermarkSource,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Adjustments requested on the command line
#[derive(Args, Debug, Clone, Default)]
pub struct AdjustmentArgs {
    /// Crop rectangle as x,y,width,height
    #[arg(long)]
    pub crop: Option<String>,
    /// Target size as WIDTHxHEIGHT, WIDTHx or xHEIGHT
    #[arg(long)]
    pub resize: Option<String>,
    /// Overlay image pasted onto the result
    #[arg(long)]
    pub watermark: Option<PathBuf>,
    /// Vertical anchor of the overlay: top, middle, bottom
    #[arg(long, default_value = "top")]
    pub vertical: String,
    /// Horizontal anchor of the overlay: left, center, right
    #[arg(long, default_value = "left")]
    pub horizontal: String,
    /// Horizontal overlay offset in pixels
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub offset_x: i64,
    /// Vertical overlay offset in pixels
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub offset_y: i64,
}

impl AdjustmentArgs {
    pub fn build(&self) -> anyhow::Result<Vec<Arc<dyn Adjustment>>> {
        let mut adjustments: Vec<Arc<dyn Adjustment>> = Vec::new();

        if let Some(crop) = &self.crop {
            let [x, y, width, height] = parse_crop(crop)?;
            adjustments.push(Arc::new(CropAdjustment::new(x, y, width, height)?));
        }

        if let Some(resize) = &self.resize {
            let (width, height) = parse_size(resize)?;
            let mut adjustment = ResizeAdjustment::new();
            if let Some(width) = width {
                adjustment.set_width(width)?;
            }
            if let Some(height) = height {
                adjustment.set_height(height)?;
            }
            adjustments.push(Arc::new(adjustment));
        }

        if let Some(path) = &self.watermark {
            let mut watermark = WatermarkAdjustment::new();
            watermark.set_vertical_position(&self.vertical)?;
            watermark.set_horizontal_position(&self.horizontal)?;
            watermark.set_vertical_offset(self.offset_y)?;
            watermark.set_horizontal_offset(self.offset_x)?;
            watermark
                .set_watermark(WatermarkSource::Path(path.clone()))
                .with_context(|| format!("Failed to load watermark {}", path.display()))?;
            adjustments.push(Arc::new(watermark));
        }

        Ok(adjustments)
    }
}

/// Parse `x,y,width,height`
pub fn parse_crop(value: &str) -> anyhow::Result<[u32; 4]> {
    let parts: Vec<u32> = value
        .split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<Result<_, _>>()
        .with_context(|| format!("Invalid crop rectangle '{}'", value))?;
    parts
        .try_into()
        .map_err(|_| anyhow!("Crop rectangle needs four values, got '{}'", value))
}

/// Parse `WIDTHxHEIGHT`; either side may be left empty
pub fn parse_size(value: &str) -> anyhow::Result<(Option<u32>, Option<u32>)> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("Invalid size '{}', expected WIDTHxHEIGHT", value))?;

    let side = |s: &str| -> anyhow::Result<Option<u32>> {
        let s = s.trim();
        if s.is_empty() {
            Ok(None)
        } else {
            s.parse()
                .map(Some)
                .with_context(|| format!("Invalid size '{}'", value))
        }
    };

    match (side(width)?, side(height)?) {
        (None, None) => Err(anyhow!("Size '{}' names neither width nor height", value)),
        size => Ok(size),
    }
}

/// Per-call output options from command line flags
pub fn output_options(quality: Option<i64>) -> anyhow::Result<Configuration> {
    let mut options = Configuration::new();
    if let Some(quality) = quality {
        options.set("quality", quality)?;
    }
    Ok(options)
}

/// Initialize tracing for the CLI binary.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("retouch=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_crop_values() {
        assert_eq!(parse_crop("1, 2,3,4").unwrap(), [1, 2, 3, 4]);
        assert!(parse_crop("1,2,3").is_err());
        assert!(parse_crop("1,2,3,4,5").is_err());
        assert!(parse_crop("a,b,c,d").is_err());
    }

    #[test]
    fn parse_size_variants() {
        assert_eq!(parse_size("200x100").unwrap(), (Some(200), Some(100)));
        assert_eq!(parse_size("200x").unwrap(), (Some(200), None));
        assert_eq!(parse_size("X50").unwrap(), (None, Some(50)));
        assert!(parse_size("x").is_err());
        assert!(parse_size("200").is_err());
        assert!(parse_size("wide x 3").is_err());
    }

    #[test]
    fn build_orders_nothing_itself() {
        let args = AdjustmentArgs {
            crop: Some("0,0,10,10".to_string()),
            resize: Some("5x".to_string()),
            ..AdjustmentArgs::default()
        };
        let adjustments = args.build().unwrap();
        let kinds: Vec<&str> = adjustments.iter().map(|a| a.kind()).collect();
        assert_eq!(kinds, vec!["crop", "resize"]);
        assert_eq!(adjustments[1].configuration().get_i64("width"), Some(5));
    }

    #[test]
    fn build_rejects_bad_anchor_before_loading_overlay() {
        let args = AdjustmentArgs {
            watermark: Some(PathBuf::from("/nonexistent/logo.png")),
            vertical: "sideways".to_string(),
            horizontal: "left".to_string(),
            ..AdjustmentArgs::default()
        };
        let err = args.build().unwrap_err();
        assert!(err.to_string().contains("verticalPosition"));
    }

    #[test]
    fn build_reports_unreadable_watermark() {
        let args = AdjustmentArgs {
            watermark: Some(PathBuf::from("/nonexistent/logo.png")),
            vertical: "top".to_string(),
            horizontal: "left".to_string(),
            ..AdjustmentArgs::default()
        };
        assert!(args.build().is_err());
    }

    #[test]
    fn output_options_carry_quality() {
        assert!(output_options(None).unwrap().is_empty());
        assert_eq!(output_options(Some(70)).unwrap().get_i64("quality"), Some(70));
    }
}
