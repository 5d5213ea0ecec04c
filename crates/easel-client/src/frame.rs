//! Image payloads and their conversion to transmittable bytes.
//!
//! This is the only module that touches the image-drawing collaborator.

use std::io::Cursor;

use image::{DynamicImage, RgbImage};

use crate::error::Result;

/// One image payload for a window slot.
///
/// Pre-encoded bytes pass through unchanged; any format the renderer can
/// decode works (JPEG, PNG, GIF). An in-memory bitmap is encoded to JPEG at
/// send time.
#[derive(Debug, Clone)]
pub enum Frame {
    Encoded(Vec<u8>),
    Bitmap(RgbImage),
}

impl Frame {
    /// The bytes that go on the wire for this frame.
    pub fn to_encoded(&self) -> Result<Vec<u8>> {
        match self {
            Frame::Encoded(bytes) => Ok(bytes.clone()),
            Frame::Bitmap(bitmap) => {
                let mut out = Cursor::new(Vec::new());
                DynamicImage::ImageRgb8(bitmap.clone())
                    .write_to(&mut out, image::ImageFormat::Jpeg)?;
                Ok(out.into_inner())
            }
        }
    }
}

impl From<Vec<u8>> for Frame {
    fn from(bytes: Vec<u8>) -> Self {
        Frame::Encoded(bytes)
    }
}

impl From<&[u8]> for Frame {
    fn from(bytes: &[u8]) -> Self {
        Frame::Encoded(bytes.to_vec())
    }
}

impl From<RgbImage> for Frame {
    fn from(bitmap: RgbImage) -> Self {
        Frame::Bitmap(bitmap)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
