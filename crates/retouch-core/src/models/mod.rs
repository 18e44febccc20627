//! Domain models shared between storage and processing

pub mod image;

pub use image::ImageSize;
