//! Image fixtures generated in memory

use image::{Delay, DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use retouch_processing::animation::encode_frames;
use retouch_processing::AnimationFrame;
use std::io::Cursor;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

pub fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), format)
        .expect("encode fixture");
    buffer
}

/// Solid white PNG
pub fn white_png(width: u32, height: u32) -> Vec<u8> {
    encode(
        &DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, WHITE)),
        ImageFormat::Png,
    )
}

/// Solid red overlay as a decoded image
pub fn red_overlay(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, RED))
}

/// Animated GIF whose frames are solid black, white, black, ...
pub fn animated_gif(width: u32, height: u32, frame_count: u32) -> Vec<u8> {
    let frames: Vec<AnimationFrame> = (0..frame_count)
        .map(|i| {
            let value = if i % 2 == 0 { 0 } else { 255 };
            AnimationFrame {
                image: DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                    width,
                    height,
                    Rgba([value, value, value, 255]),
                )),
                delay: Delay::from_numer_denom_ms(100, 1),
            }
        })
        .collect();
    encode_frames(&frames).expect("encode animated fixture")
}

/// Single frame GIF
pub fn still_gif(width: u32, height: u32) -> Vec<u8> {
    encode(
        &DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]))),
        ImageFormat::Gif,
    )
}
