//! Frame and detection primitives.
//!
//! - `Frame`: Owned, row-major pixel buffer moved between pipeline stages.
//! - `GrayFrame`: Single-channel buffer used as the detector baseline and as
//!   the intermediate raster for diff/threshold/dilate.
//! - `BoundingBox`: Axis-aligned detection rectangle in pixel coordinates.
//!
//! Frames are owned by exactly one stage at a time. Sending a frame on a
//! channel transfers ownership fully; the only derived data a stage may keep
//! is the detector's grayscale baseline.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// One decoded image from the video source.
///
/// Pixel data is row-major with `channels` interleaved bytes per pixel
/// (1 = grayscale, 3 = RGB). The frame's position in the stream is conveyed
/// by arrival order on the channel, not by an explicit field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

impl Frame {
    /// Create a frame from raw pixel data. Called by the ingestion layer.
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Result<Self> {
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(anyhow!(
                "frame buffer size {} does not match {}x{}x{}",
                data.len(),
                width,
                height,
                channels
            ));
        }
        if !matches!(channels, 1 | 3) {
            return Err(anyhow!("unsupported channel count {}", channels));
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Byte offset of pixel (x, y).
    #[inline]
    pub fn pixel_offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels as usize
    }

    /// Convert to a single-channel intensity image using integer Rec.601
    /// weights. A 1-channel frame is copied as-is.
    pub fn to_gray(&self) -> GrayFrame {
        let pixels = self.width as usize * self.height as usize;
        let mut gray = Vec::with_capacity(pixels);
        match self.channels {
            1 => gray.extend_from_slice(&self.data),
            _ => {
                for px in self.data.chunks_exact(3) {
                    let luma = (px[0] as u32 * 299 + px[1] as u32 * 587 + px[2] as u32 * 114)
                        / 1000;
                    gray.push(luma as u8);
                }
            }
        }
        GrayFrame {
            data: gray,
            width: self.width,
            height: self.height,
        }
    }
}

/// Single-channel intensity image.
///
/// The detector stores exactly one of these as its previous-frame baseline
/// and reuses the type for the binary motion mask.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl GrayFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        if data.len() != width as usize * height as usize {
            return Err(anyhow!(
                "gray buffer size {} does not match {}x{}",
                data.len(),
                width,
                height
            ));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    pub fn same_extent(&self, other: &GrayFrame) -> bool {
        self.width == other.width && self.height == other.height
    }
}

/// Axis-aligned detection rectangle `(x, y, w, h)` in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Clip this box to a `width` x `height` extent. Returns `None` when the
    /// box lies entirely outside it.
    pub fn clipped(&self, width: u32, height: u32) -> Option<BoundingBox> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let w = self.w.min(width - self.x);
        let h = self.h.min(height - self.y);
        if w == 0 || h == 0 {
            return None;
        }
        Some(BoundingBox::new(self.x, self.y, w, h))
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }
}
