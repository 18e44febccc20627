//! Decoded image handles

use image::{Delay, DynamicImage, Frame, GenericImageView, ImageFormat};
use retouch_core::{ImageSize, MediaError, MediaResult};

use crate::animation;

/// One composited frame of an animation
#[derive(Debug, Clone)]
pub struct AnimationFrame {
    pub image: DynamicImage,
    pub delay: Delay,
}

impl From<Frame> for AnimationFrame {
    fn from(frame: Frame) -> Self {
        let delay = frame.delay();
        AnimationFrame {
            image: DynamicImage::ImageRgba8(frame.into_buffer()),
            delay,
        }
    }
}

/// Decoded raster owned by a single processing call
#[derive(Debug, Clone)]
pub enum ImageHandle {
    Still(DynamicImage),
    /// Frames in display order, never empty
    Animated(Vec<AnimationFrame>),
}

impl ImageHandle {
    /// Decode `data`. GIF payloads with more than one frame become animated
    /// handles; everything else is decoded as a single image.
    pub fn open(data: &[u8], format: Option<ImageFormat>) -> MediaResult<Self> {
        let format = match format {
            Some(format) => format,
            None => image::guess_format(data)
                .map_err(|e| MediaError::ImageFile(format!("Unknown image format: {}", e)))?,
        };

        if format == ImageFormat::Gif && animation::is_animated_gif(data) {
            return Self::from_frames(animation::decode_frames(data)?);
        }

        let image = image::load_from_memory_with_format(data, format)
            .map_err(|e| MediaError::ImageFile(format!("Failed to decode image: {}", e)))?;
        Ok(ImageHandle::Still(image))
    }

    pub fn from_frames(frames: Vec<AnimationFrame>) -> MediaResult<Self> {
        if frames.is_empty() {
            return Err(MediaError::ImageFile(
                "Animated image without frames".to_string(),
            ));
        }
        Ok(ImageHandle::Animated(frames))
    }

    pub fn is_animated(&self) -> bool {
        matches!(self, ImageHandle::Animated(_))
    }

    /// Size of the image, the first frame for animations
    pub fn dimensions(&self) -> ImageSize {
        match self {
            ImageHandle::Still(image) => ImageSize::from(image.dimensions()),
            ImageHandle::Animated(frames) => frames
                .first()
                .map(|frame| ImageSize::from(frame.image.dimensions()))
                .unwrap_or_default(),
        }
    }

    pub fn frame_count(&self) -> usize {
        match self {
            ImageHandle::Still(_) => 1,
            ImageHandle::Animated(frames) => frames.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([4, 5, 6])));
        let mut buffer = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn test_open_still_with_guessed_format() {
        let handle = ImageHandle::open(&png(12, 7), None).unwrap();
        assert!(!handle.is_animated());
        assert_eq!(handle.dimensions(), ImageSize::new(12, 7));
        assert_eq!(handle.frame_count(), 1);
    }

    #[test]
    fn test_open_animated_gif() {
        let frames: Vec<AnimationFrame> = (0..3)
            .map(|i| AnimationFrame {
                image: DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                    5,
                    3,
                    Rgba([i * 80, 0, 0, 255]),
                )),
                delay: Delay::from_numer_denom_ms(50, 1),
            })
            .collect();
        let data = animation::encode_frames(&frames).unwrap();

        let handle = ImageHandle::open(&data, Some(ImageFormat::Gif)).unwrap();
        assert!(handle.is_animated());
        assert_eq!(handle.frame_count(), 3);
        assert_eq!(handle.dimensions(), ImageSize::new(5, 3));
    }

    #[test]
    fn test_open_garbage_fails() {
        assert!(matches!(
            ImageHandle::open(b"nope", None),
            Err(MediaError::ImageFile(_))
        ));
        assert!(matches!(
            ImageHandle::open(b"nope", Some(ImageFormat::Png)),
            Err(MediaError::ImageFile(_))
        ));
    }

    #[test]
    fn test_from_frames_rejects_empty() {
        assert!(ImageHandle::from_frames(Vec::new()).is_err());
    }
}
