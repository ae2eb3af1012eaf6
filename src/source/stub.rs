//! Synthetic frame source for tests and demos.
//!
//! `stub://<name>[?frames=N[&width=W&height=H]]` yields N frames (default
//! 100) of a dark scene with a bright square that moves a few pixels per
//! frame, so the detector downstream sees genuine frame-to-frame motion.

use anyhow::{anyhow, Result};

use crate::frame::Frame;

const DEFAULT_FRAMES: u64 = 100;
const DEFAULT_WIDTH: u32 = 320;
const DEFAULT_HEIGHT: u32 = 240;
const SQUARE_SIZE: u32 = 24;

pub(crate) struct StubSource {
    remaining: u64,
    frame_index: u64,
    width: u32,
    height: u32,
}

impl StubSource {
    /// Parse the part of the identifier after `stub://`.
    pub(crate) fn parse(rest: &str) -> Result<Self> {
        let mut frames = DEFAULT_FRAMES;
        let mut width = DEFAULT_WIDTH;
        let mut height = DEFAULT_HEIGHT;
        if let Some((_, query)) = rest.split_once('?') {
            for pair in query.split('&') {
                let Some((key, value)) = pair.split_once('=') else {
                    return Err(anyhow!("malformed stub parameter '{}'", pair));
                };
                let parsed: u64 = value
                    .parse()
                    .map_err(|_| anyhow!("stub parameter {}={} is not a number", key, value))?;
                match key {
                    "frames" => frames = parsed,
                    "width" => width = parsed as u32,
                    "height" => height = parsed as u32,
                    _ => return Err(anyhow!("unknown stub parameter '{}'", key)),
                }
            }
        }
        // The square needs room to travel; a degenerate extent would leave
        // nothing to sweep.
        if width <= SQUARE_SIZE * 2 || height <= SQUARE_SIZE * 2 {
            return Err(anyhow!("stub frame extent {}x{} is too small", width, height));
        }
        Ok(Self {
            remaining: frames,
            frame_index: 0,
            width,
            height,
        })
    }

    pub(crate) fn next_frame(&mut self) -> Option<Frame> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let mut data = vec![16u8; self.width as usize * self.height as usize * 3];
        // Bright square sweeping diagonally, wrapping before the border.
        let travel_x = (self.width - SQUARE_SIZE * 2) as u64;
        let travel_y = (self.height - SQUARE_SIZE * 2) as u64;
        let x0 = SQUARE_SIZE + ((self.frame_index * 4) % travel_x) as u32;
        let y0 = SQUARE_SIZE + ((self.frame_index * 3) % travel_y) as u32;
        for y in y0..y0 + SQUARE_SIZE {
            for x in x0..x0 + SQUARE_SIZE {
                let off = (y as usize * self.width as usize + x as usize) * 3;
                data[off] = 230;
                data[off + 1] = 230;
                data[off + 2] = 230;
            }
        }
        self.frame_index += 1;

        // Geometry is fixed per source, so construction cannot fail.
        Frame::new(data, self.width, self.height, 3).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_frame_count_and_extent() {
        let source = StubSource::parse("cam?frames=7&width=64&height=64").unwrap();
        assert_eq!(source.remaining, 7);
        assert_eq!(source.width, 64);
        assert_eq!(source.height, 64);
    }

    #[test]
    fn rejects_unknown_parameters() {
        assert!(StubSource::parse("cam?fps=10").is_err());
        assert!(StubSource::parse("cam?frames=abc").is_err());
    }

    #[test]
    fn consecutive_frames_differ() {
        let mut source = StubSource::parse("cam?frames=2").unwrap();
        let a = source.next_frame().unwrap();
        let b = source.next_frame().unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
        assert!(source.next_frame().is_none());
    }
}
