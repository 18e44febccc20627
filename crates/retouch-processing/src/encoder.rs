//! Output encoding
//!
//! Turns a processed [`ImageHandle`] back into bytes of the source format,
//! honouring the quality settings of [`OutputOptions`].

use bytes::Bytes;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, GenericImageView, ImageFormat};
use retouch_core::{MediaError, MediaResult};
use std::io::Cursor;

use crate::animation;
use crate::handle::ImageHandle;
use crate::options::OutputOptions;

/// Encoder for processed images
pub struct ImageEncoder;

impl ImageEncoder {
    /// Encode `handle` as `format`. Animations are always written as GIF.
    pub fn encode(
        handle: &ImageHandle,
        format: ImageFormat,
        options: &OutputOptions,
    ) -> MediaResult<Bytes> {
        let start = std::time::Instant::now();

        let encoded = match handle {
            ImageHandle::Animated(frames) => Bytes::from(animation::encode_frames(frames)?),
            ImageHandle::Still(img) => match format {
                ImageFormat::Jpeg => Self::encode_jpeg(img, options.quality)?,
                ImageFormat::Png => Self::encode_png(img, options.compression_level)?,
                ImageFormat::WebP => Self::encode_webp(img, options.quality),
                ImageFormat::Gif => {
                    Self::encode_generic(&DynamicImage::ImageRgba8(img.to_rgba8()), format)?
                }
                other => Self::encode_generic(img, other)?,
            },
        };

        tracing::debug!(
            format = ?format,
            animated = handle.is_animated(),
            quality = options.quality,
            compression_level = options.compression_level,
            size_bytes = encoded.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Encoded processed image"
        );

        Ok(encoded)
    }

    /// Encode to JPEG using mozjpeg
    fn encode_jpeg(img: &DynamicImage, quality: u8) -> MediaResult<Bytes> {
        let rgb_img = img.to_rgb8();
        let (width, height) = rgb_img.dimensions();

        let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
        comp.set_size(width as usize, height as usize);
        comp.set_quality(quality as f32);
        comp.set_optimize_coding(true);

        let mut comp = comp.start_compress(Vec::new()).map_err(encode_error)?;
        comp.write_scanlines(&rgb_img).map_err(encode_error)?;
        let jpeg_data = comp.finish().map_err(encode_error)?;

        Ok(Bytes::from(jpeg_data))
    }

    /// Encode to PNG, mapping the 0..=9 level onto the encoder presets
    fn encode_png(img: &DynamicImage, compression_level: u8) -> MediaResult<Bytes> {
        let compression = match compression_level {
            0..=2 => CompressionType::Fast,
            3..=6 => CompressionType::Default,
            _ => CompressionType::Best,
        };

        let mut buffer = Vec::new();
        let encoder =
            PngEncoder::new_with_quality(Cursor::new(&mut buffer), compression, FilterType::Adaptive);
        img.write_with_encoder(encoder).map_err(encode_error)?;

        Ok(Bytes::from(buffer))
    }

    fn encode_webp(img: &DynamicImage, quality: u8) -> Bytes {
        let (width, height) = img.dimensions();
        let rgba_img = img.to_rgba8();

        let encoder = webp::Encoder::from_rgba(&rgba_img, width, height);
        let webp_data = encoder.encode(quality as f32);

        Bytes::copy_from_slice(&webp_data)
    }

    fn encode_generic(img: &DynamicImage, format: ImageFormat) -> MediaResult<Bytes> {
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), format)
            .map_err(encode_error)?;
        Ok(Bytes::from(buffer))
    }
}

fn encode_error(err: impl std::fmt::Display) -> MediaError {
    MediaError::Internal(format!("Failed to encode image: {}", err))
}
