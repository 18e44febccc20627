//! Overlay placement
//!
//! Pure arithmetic turning named anchors plus pixel offsets into the top-left
//! point of an overlay. No clamping happens here: the result may be negative
//! or outside the base image, clipping is left to the paste primitive.

use retouch_core::{ImageSize, MediaError, MediaResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Absolute placement of an overlay's top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalAnchor {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAnchor {
    Top,
    Middle,
    Bottom,
}

impl HorizontalAnchor {
    pub fn as_str(self) -> &'static str {
        match self {
            HorizontalAnchor::Left => "left",
            HorizontalAnchor::Center => "center",
            HorizontalAnchor::Right => "right",
        }
    }
}

impl VerticalAnchor {
    pub fn as_str(self) -> &'static str {
        match self {
            VerticalAnchor::Top => "top",
            VerticalAnchor::Middle => "middle",
            VerticalAnchor::Bottom => "bottom",
        }
    }
}

impl FromStr for HorizontalAnchor {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(HorizontalAnchor::Left),
            "center" => Ok(HorizontalAnchor::Center),
            "right" => Ok(HorizontalAnchor::Right),
            other => Err(MediaError::invalid_adjustment(
                "horizontalPosition",
                other,
                "must be one of left, center, right",
            )),
        }
    }
}

impl FromStr for VerticalAnchor {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(VerticalAnchor::Top),
            "middle" => Ok(VerticalAnchor::Middle),
            "bottom" => Ok(VerticalAnchor::Bottom),
            other => Err(MediaError::invalid_adjustment(
                "verticalPosition",
                other,
                "must be one of top, middle, bottom",
            )),
        }
    }
}

impl fmt::Display for HorizontalAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for VerticalAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct PositionResolver;

impl PositionResolver {
    /// Resolve anchor names and offsets into an overlay position.
    ///
    /// Unknown anchor names fail with `InvalidAdjustmentConfiguration`.
    pub fn resolve(
        image: ImageSize,
        overlay: ImageSize,
        horizontal: &str,
        horizontal_offset: i64,
        vertical: &str,
        vertical_offset: i64,
    ) -> MediaResult<Position> {
        let horizontal: HorizontalAnchor = horizontal.parse()?;
        let vertical: VerticalAnchor = vertical.parse()?;
        Ok(Self::resolve_anchored(
            image,
            overlay,
            horizontal,
            horizontal_offset,
            vertical,
            vertical_offset,
        ))
    }

    pub fn resolve_anchored(
        image: ImageSize,
        overlay: ImageSize,
        horizontal: HorizontalAnchor,
        horizontal_offset: i64,
        vertical: VerticalAnchor,
        vertical_offset: i64,
    ) -> Position {
        let free_x = image.width as i64 - overlay.width as i64;
        let free_y = image.height as i64 - overlay.height as i64;

        let x = match horizontal {
            HorizontalAnchor::Left => 0,
            HorizontalAnchor::Right => free_x,
            HorizontalAnchor::Center => half_rounded(free_x),
        };
        let y = match vertical {
            VerticalAnchor::Top => 0,
            VerticalAnchor::Bottom => free_y,
            VerticalAnchor::Middle => half_rounded(free_y),
        };

        Position {
            x: x + horizontal_offset,
            y: y + vertical_offset,
        }
    }
}

/// `round(value / 2)` with halves rounded away from zero
fn half_rounded(value: i64) -> i64 {
    (value as f64 / 2.0).round() as i64
}
