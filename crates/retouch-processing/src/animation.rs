//! Animated GIF support
//!
//! Detection is a pure scan over the encoded bytes. Decoding yields fully
//! composited frames so every frame can be handed to the pipeline as a
//! standalone image; encoding reassembles them in order.

use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::{AnimationDecoder, Frame};
use retouch_core::{MediaError, MediaResult};
use std::io::Cursor;

use crate::handle::AnimationFrame;

const EXTENSION_INTRODUCER: u8 = 0x21;
const GRAPHIC_CONTROL_LABEL: u8 = 0xF9;
const GRAPHIC_CONTROL_BLOCK_SIZE: u8 = 0x04;
const BLOCK_TERMINATOR: u8 = 0x00;
const IMAGE_DESCRIPTOR: u8 = 0x2C;

/// Length of `21 F9 04 <4 bytes> 00`, the trailing introducer not included
const GRAPHIC_CONTROL_LENGTH: usize = 8;

/// Count graphic control extensions that are immediately followed by an image
/// descriptor or another extension.
///
/// Matches never overlap: the following introducer belongs to the match, so a
/// control block directly followed by the next control block counts once.
pub fn count_graphic_control_blocks(data: &[u8]) -> usize {
    let mut count = 0;
    let mut i = 0;
    while i + GRAPHIC_CONTROL_LENGTH < data.len() {
        let window = &data[i..=i + GRAPHIC_CONTROL_LENGTH];
        if window[0] == EXTENSION_INTRODUCER
            && window[1] == GRAPHIC_CONTROL_LABEL
            && window[2] == GRAPHIC_CONTROL_BLOCK_SIZE
            && window[7] == BLOCK_TERMINATOR
            && matches!(window[8], IMAGE_DESCRIPTOR | EXTENSION_INTRODUCER)
        {
            count += 1;
            i += GRAPHIC_CONTROL_LENGTH + 1;
        } else {
            i += 1;
        }
    }
    count
}

/// A GIF payload is animated when it holds more than one qualifying block
pub fn is_animated_gif(data: &[u8]) -> bool {
    count_graphic_control_blocks(data) > 1
}

/// Decode every frame of a GIF, composited to the full canvas
pub fn decode_frames(data: &[u8]) -> MediaResult<Vec<AnimationFrame>> {
    let decoder = GifDecoder::new(Cursor::new(data))
        .map_err(|e| MediaError::ImageFile(format!("Failed to read GIF: {}", e)))?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .map_err(|e| MediaError::ImageFile(format!("Failed to decode GIF frames: {}", e)))?;

    if frames.is_empty() {
        return Err(MediaError::ImageFile("GIF contains no frames".to_string()));
    }

    Ok(frames.into_iter().map(AnimationFrame::from).collect())
}

/// Encode frames as an infinitely looping GIF, keeping order and delays
pub fn encode_frames(frames: &[AnimationFrame]) -> MediaResult<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buffer);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| MediaError::Internal(format!("Failed to configure GIF encoder: {}", e)))?;
        encoder
            .encode_frames(
                frames
                    .iter()
                    .map(|frame| Frame::from_parts(frame.image.to_rgba8(), 0, 0, frame.delay)),
            )
            .map_err(|e| MediaError::Internal(format!("Failed to encode GIF frames: {}", e)))?;
    }
    Ok(buffer)
}
