//! Adjustment pipeline
//!
//! Orders a set of adjustments deterministically and applies the eligible ones
//! to an image, or to every frame of an animation.

use image::DynamicImage;
use rayon::prelude::*;
use retouch_core::{MediaError, MediaResult};
use std::cmp::Ordering;
use std::sync::Arc;

use crate::adjustment::{Adjustment, ImageAdjustment};
use crate::handle::{AnimationFrame, ImageHandle};

/// Ordered adjustments of one processing request
#[derive(Debug, Clone)]
pub struct AdjustmentPipeline {
    adjustments: Vec<Arc<dyn Adjustment>>,
}

impl AdjustmentPipeline {
    /// Validate and order `adjustments`.
    ///
    /// Every item must provide the image adjustment capability, otherwise
    /// construction fails with `AdjustmentContractViolation`.
    pub fn new(adjustments: &[Arc<dyn Adjustment>]) -> MediaResult<Self> {
        for adjustment in adjustments {
            image_capability(adjustment.as_ref())?;
        }

        let mut ordered = adjustments.to_vec();
        ordered.sort_by(|a, b| compare(a.as_ref(), b.as_ref()));
        Ok(Self {
            adjustments: ordered,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.adjustments.is_empty()
    }

    /// Adjustments in execution order
    pub fn adjustments(&self) -> &[Arc<dyn Adjustment>] {
        &self.adjustments
    }

    /// Kinds in execution order
    pub fn order(&self) -> Vec<&'static str> {
        self.adjustments.iter().map(|a| a.kind()).collect()
    }

    /// Run every applicable adjustment on `image`.
    ///
    /// Returns the resulting image and whether any adjustment ran.
    pub fn apply(&self, mut image: DynamicImage) -> MediaResult<(DynamicImage, bool)> {
        let mut applied_any = false;

        for adjustment in &self.adjustments {
            let capability = image_capability(adjustment.as_ref())?;
            if !capability.can_be_applied(&image) {
                tracing::debug!(kind = adjustment.kind(), "Adjustment not applicable, skipped");
                continue;
            }

            image = capability.apply_to_image(image)?;
            applied_any = true;

            tracing::debug!(
                kind = adjustment.kind(),
                configuration_hash = %adjustment.configuration().hash(),
                width = image.width(),
                height = image.height(),
                "Adjustment applied"
            );
        }

        Ok((image, applied_any))
    }

    /// Run the pipeline on each frame with the same ordering. Frame order is
    /// preserved when `parallel` spreads the work over the rayon pool.
    pub fn apply_frames(
        &self,
        frames: Vec<AnimationFrame>,
        parallel: bool,
    ) -> MediaResult<(Vec<AnimationFrame>, bool)> {
        let apply_frame = |frame: AnimationFrame| -> MediaResult<(AnimationFrame, bool)> {
            let (image, applied) = self.apply(frame.image)?;
            Ok((
                AnimationFrame {
                    image,
                    delay: frame.delay,
                },
                applied,
            ))
        };

        let results: Vec<(AnimationFrame, bool)> = if parallel {
            frames
                .into_par_iter()
                .map(apply_frame)
                .collect::<MediaResult<_>>()?
        } else {
            frames
                .into_iter()
                .map(apply_frame)
                .collect::<MediaResult<_>>()?
        };

        let applied_any = results.iter().any(|(_, applied)| *applied);
        let frames = results.into_iter().map(|(frame, _)| frame).collect();
        Ok((frames, applied_any))
    }

    /// Apply to a still image once, or to every frame of an animation
    pub fn apply_handle(
        &self,
        handle: ImageHandle,
        parallel: bool,
    ) -> MediaResult<(ImageHandle, bool)> {
        match handle {
            ImageHandle::Still(image) => {
                let (image, applied) = self.apply(image)?;
                Ok((ImageHandle::Still(image), applied))
            }
            ImageHandle::Animated(frames) => {
                let frame_count = frames.len();
                let (frames, applied) = self.apply_frames(frames, parallel)?;
                tracing::debug!(frame_count, applied, "Applied pipeline to animation frames");
                Ok((ImageHandle::from_frames(frames)?, applied))
            }
        }
    }
}

fn image_capability(adjustment: &dyn Adjustment) -> MediaResult<&dyn ImageAdjustment> {
    adjustment.as_image_adjustment().ok_or_else(|| {
        MediaError::AdjustmentContractViolation(format!(
            "Adjustment '{}' does not implement the image adjustment contract",
            adjustment.kind()
        ))
    })
}

/// Declared priority, then kind, then configuration hash
fn compare(a: &dyn Adjustment, b: &dyn Adjustment) -> Ordering {
    a.priority()
        .cmp(&b.priority())
        .then_with(|| a.kind().cmp(b.kind()))
        .then_with(|| a.configuration().hash().cmp(b.configuration().hash()))
}
