//! Retouch Processing Library
//!
//! Adjustment pipeline and image service: adjustments are ordered and applied
//! to decoded images (frame by frame for animated GIFs), results are encoded
//! with the source format and handed to a [`retouch_storage::ResourceStore`].

pub mod adjustment;
pub mod animation;
pub mod encoder;
pub mod handle;
pub mod options;
pub mod pipeline;
pub mod position;
pub mod service;

pub use adjustment::{
    Adjustment, AdjustmentRecord, AdjustmentRegistry, CropAdjustment, ImageAdjustment,
    RatioMode, ResizeAdjustment, WatermarkAdjustment, WatermarkSource,
};
pub use animation::{count_graphic_control_blocks, is_animated_gif};
pub use encoder::ImageEncoder;
pub use handle::{AnimationFrame, ImageHandle};
pub use options::{compression_level_for, OutputOptions};
pub use pipeline::AdjustmentPipeline;
pub use position::{HorizontalAnchor, Position, PositionResolver, VerticalAnchor};
pub use service::{derived_filename, ImageService, ProcessedImage, ProcessingResult};
