//! Frame compositing primitives for the presenter.
//!
//! Outline drawing, regional Gaussian blur, and a small built-in raster
//! font for the timestamp overlay. All operations clip against the frame
//! extent; out-of-range boxes are drawn partially rather than rejected.

use crate::frame::{BoundingBox, Frame};

/// Outline color (RGB). Green, matching the detection overlay convention.
pub const OUTLINE_COLOR: [u8; 3] = [0, 255, 0];

/// Outline thickness in pixels.
pub const OUTLINE_THICKNESS: u32 = 2;

/// Gaussian kernel width for region blurring.
pub const BLUR_KERNEL: usize = 15;

// Sigma derived from the kernel size: 0.3*((k-1)*0.5 - 1) + 0.8 for k = 15.
const BLUR_SIGMA: f32 = 2.6;

/// Draw a rectangle outline of `OUTLINE_THICKNESS` pixels just inside the
/// box edges, clipped to the frame.
pub fn draw_outline(frame: &mut Frame, bbox: BoundingBox) {
    let Some(bbox) = bbox.clipped(frame.width, frame.height) else {
        return;
    };
    let channels = frame.channels as usize;
    for y in bbox.y..bbox.y + bbox.h {
        for x in bbox.x..bbox.x + bbox.w {
            let on_border = x - bbox.x < OUTLINE_THICKNESS
                || bbox.x + bbox.w - 1 - x < OUTLINE_THICKNESS
                || y - bbox.y < OUTLINE_THICKNESS
                || bbox.y + bbox.h - 1 - y < OUTLINE_THICKNESS;
            if !on_border {
                continue;
            }
            let off = frame.pixel_offset(x, y);
            let pixel = &mut frame.as_bytes_mut()[off..off + channels];
            if channels == 3 {
                pixel.copy_from_slice(&OUTLINE_COLOR);
            } else {
                pixel[0] = 255;
            }
        }
    }
}

/// Replace the interior of `bbox` with a Gaussian-smoothed copy of itself.
///
/// Separable 15-tap kernel; samples outside the box clamp to its edge, so
/// pixels outside the box are never read or written.
pub fn blur_region(frame: &mut Frame, bbox: BoundingBox) {
    let Some(bbox) = bbox.clipped(frame.width, frame.height) else {
        return;
    };
    let kernel = gaussian_kernel();
    let radius = (BLUR_KERNEL / 2) as i64;
    let channels = frame.channels as usize;
    let w = bbox.w as i64;
    let h = bbox.h as i64;

    // Extract the region once; both passes operate on region-local buffers.
    let mut region = vec![0f32; (w * h) as usize * channels];
    for y in 0..h {
        for x in 0..w {
            let off = frame.pixel_offset(bbox.x + x as u32, bbox.y + y as u32);
            for c in 0..channels {
                region[((y * w + x) as usize) * channels + c] =
                    frame.as_bytes()[off + c] as f32;
            }
        }
    }

    // Horizontal pass.
    let mut tmp = vec![0f32; region.len()];
    for y in 0..h {
        for x in 0..w {
            for c in 0..channels {
                let mut acc = 0f32;
                for (k, &weight) in kernel.iter().enumerate() {
                    let sx = (x + k as i64 - radius).clamp(0, w - 1);
                    acc += weight * region[((y * w + sx) as usize) * channels + c];
                }
                tmp[((y * w + x) as usize) * channels + c] = acc;
            }
        }
    }

    // Vertical pass, written back to the frame.
    for y in 0..h {
        for x in 0..w {
            let off = frame.pixel_offset(bbox.x + x as u32, bbox.y + y as u32);
            for c in 0..channels {
                let mut acc = 0f32;
                for (k, &weight) in kernel.iter().enumerate() {
                    let sy = (y + k as i64 - radius).clamp(0, h - 1);
                    acc += weight * tmp[((sy * w + x) as usize) * channels + c];
                }
                frame.as_bytes_mut()[off + c] = acc.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

fn gaussian_kernel() -> [f32; BLUR_KERNEL] {
    let radius = (BLUR_KERNEL / 2) as i32;
    let mut kernel = [0f32; BLUR_KERNEL];
    let mut sum = 0f32;
    for (i, slot) in kernel.iter_mut().enumerate() {
        let d = (i as i32 - radius) as f32;
        *slot = (-d * d / (2.0 * BLUR_SIGMA * BLUR_SIGMA)).exp();
        sum += *slot;
    }
    for slot in &mut kernel {
        *slot /= sum;
    }
    kernel
}

// ----------------------------------------------------------------------------
// Timestamp glyphs
// ----------------------------------------------------------------------------

const GLYPH_WIDTH: usize = 5;
const GLYPH_HEIGHT: usize = 7;

/// 5x7 bitmaps for '0'-'9' and ':'. One byte per row, low 5 bits used,
/// most significant used bit = leftmost column.
const GLYPHS: [[u8; GLYPH_HEIGHT]; 11] = [
    [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E], // 0
    [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E], // 1
    [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F], // 2
    [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E], // 3
    [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02], // 4
    [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E], // 5
    [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E], // 6
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08], // 7
    [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E], // 8
    [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C], // 9
    [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00], // :
];

fn glyph_for(ch: char) -> Option<&'static [u8; GLYPH_HEIGHT]> {
    match ch {
        '0'..='9' => Some(&GLYPHS[ch as usize - '0' as usize]),
        ':' => Some(&GLYPHS[10]),
        _ => None,
    }
}

/// Draw `text` (digits and colons only; other characters advance the cursor
/// without painting) in white at `(x, y)` with integer `scale`.
pub fn draw_text(frame: &mut Frame, text: &str, x: u32, y: u32, scale: u32) {
    let channels = frame.channels as usize;
    let advance = (GLYPH_WIDTH as u32 + 1) * scale;
    let mut cursor_x = x;
    for ch in text.chars() {
        if let Some(glyph) = glyph_for(ch) {
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                        continue;
                    }
                    for dy in 0..scale {
                        for dx in 0..scale {
                            let px = cursor_x + col as u32 * scale + dx;
                            let py = y + row as u32 * scale + dy;
                            if px >= frame.width || py >= frame.height {
                                continue;
                            }
                            let off = frame.pixel_offset(px, py);
                            for c in 0..channels {
                                frame.as_bytes_mut()[off + c] = 255;
                            }
                        }
                    }
                }
            }
        }
        cursor_x += advance;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{BoundingBox, Frame};

    fn flat_frame(width: u32, height: u32, fill: u8) -> Frame {
        Frame::new(vec![fill; (width * height * 3) as usize], width, height, 3).unwrap()
    }

    #[test]
    fn outline_paints_border_only() {
        let mut frame = flat_frame(32, 32, 50);
        let bbox = BoundingBox::new(8, 8, 12, 12);
        draw_outline(&mut frame, bbox);

        // Corner of the border is green.
        let off = frame.pixel_offset(8, 8);
        assert_eq!(&frame.as_bytes()[off..off + 3], &OUTLINE_COLOR);
        // Center is untouched.
        let off = frame.pixel_offset(14, 14);
        assert_eq!(&frame.as_bytes()[off..off + 3], &[50, 50, 50]);
        // Just outside is untouched.
        let off = frame.pixel_offset(7, 8);
        assert_eq!(&frame.as_bytes()[off..off + 3], &[50, 50, 50]);
    }

    #[test]
    fn outline_clips_to_frame() {
        let mut frame = flat_frame(16, 16, 0);
        draw_outline(&mut frame, BoundingBox::new(12, 12, 20, 20));
        // Does not panic; the visible part of the border is painted.
        let off = frame.pixel_offset(12, 12);
        assert_eq!(&frame.as_bytes()[off..off + 3], &OUTLINE_COLOR);
    }

    #[test]
    fn blur_changes_interior_and_nothing_else() {
        let mut frame = flat_frame(64, 64, 20);
        // A sharp bright feature inside the box gives the blur work to do.
        let spot = frame.pixel_offset(30, 30);
        for c in 0..3 {
            frame.as_bytes_mut()[spot + c] = 255;
        }
        let before = frame.clone();
        let bbox = BoundingBox::new(24, 24, 12, 12);
        blur_region(&mut frame, bbox);

        // The bright spot got smoothed down.
        assert_ne!(
            &frame.as_bytes()[spot..spot + 3],
            &before.as_bytes()[spot..spot + 3]
        );
        // Every pixel outside the box is bit-identical.
        for y in 0..64u32 {
            for x in 0..64u32 {
                if bbox.contains(x, y) {
                    continue;
                }
                let off = frame.pixel_offset(x, y);
                assert_eq!(
                    &frame.as_bytes()[off..off + 3],
                    &before.as_bytes()[off..off + 3],
                    "pixel ({}, {}) outside the box changed",
                    x,
                    y
                );
            }
        }
    }

    #[test]
    fn blur_preserves_flat_regions() {
        let mut frame = flat_frame(32, 32, 77);
        blur_region(&mut frame, BoundingBox::new(4, 4, 20, 20));
        // A constant region is a fixed point of the normalized kernel.
        assert!(frame.as_bytes().iter().all(|&b| b == 77));
    }

    #[test]
    fn kernel_is_normalized() {
        let sum: f32 = gaussian_kernel().iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn text_paints_digits_and_skips_unknown_chars() {
        let mut frame = flat_frame(128, 32, 0);
        draw_text(&mut frame, "12:34", 2, 2, 2);
        assert!(frame.as_bytes().iter().any(|&b| b == 255));

        let mut blank = flat_frame(128, 32, 0);
        draw_text(&mut blank, "xyz", 2, 2, 2);
        assert!(blank.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn text_clips_at_frame_edge() {
        let mut frame = flat_frame(16, 8, 0);
        // Anchor near the corner; must not panic.
        draw_text(&mut frame, "23:59:59", 10, 4, 3);
    }
}
