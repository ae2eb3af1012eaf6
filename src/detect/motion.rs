//! Stateful frame-differencing detector.
//!
//! Per frame: grayscale -> absolute difference against the stored baseline
//! -> binary threshold -> dilation -> bounding boxes of the remaining
//! 8-connected regions, in raster discovery order. The baseline is replaced
//! with the current grayscale frame after every processed frame.

use anyhow::{anyhow, Result};

use crate::frame::{BoundingBox, Frame, GrayFrame};

/// Intensity delta strictly above which a pixel counts as motion.
pub const MOTION_THRESHOLD: u8 = 25;

/// Number of 3x3 dilation passes over the binary mask. Merges adjacent
/// motion blobs and suppresses single-pixel noise splits.
pub const DILATE_ITERATIONS: u32 = 2;

const MASK_ON: u8 = 255;

/// Motion detector with a single-slot previous-frame baseline.
///
/// Exactly one instance runs per pipeline; the baseline is a private field,
/// never shared.
#[derive(Default)]
pub struct MotionDetector {
    baseline: Option<GrayFrame>,
}

impl MotionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one frame and return its detection set.
    ///
    /// The first frame only establishes the baseline and always yields an
    /// empty set. A frame whose extent differs from the baseline's is a
    /// processing failure; the caller treats it as fatal to the stage.
    pub fn process(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>> {
        let gray = frame.to_gray();

        let detections = match self.baseline.take() {
            None => Vec::new(),
            Some(baseline) => {
                if !baseline.same_extent(&gray) {
                    return Err(anyhow!(
                        "frame extent changed mid-stream: {}x{} -> {}x{}",
                        baseline.width,
                        baseline.height,
                        gray.width,
                        gray.height
                    ));
                }
                let mut mask = abs_diff_threshold(&gray, &baseline, MOTION_THRESHOLD);
                for _ in 0..DILATE_ITERATIONS {
                    mask = dilate3x3(&mask);
                }
                bounding_boxes(&mask)
            }
        };

        self.baseline = Some(gray);
        Ok(detections)
    }

    /// Drop the baseline. Called when the stage stops.
    pub fn reset(&mut self) {
        self.baseline = None;
    }
}

/// Pixel-wise |a - b|, binarized: strictly above `threshold` becomes 255,
/// everything else 0.
fn abs_diff_threshold(a: &GrayFrame, b: &GrayFrame, threshold: u8) -> GrayFrame {
    let data = a
        .data
        .iter()
        .zip(&b.data)
        .map(|(&x, &y)| {
            let diff = x.abs_diff(y);
            if diff > threshold {
                MASK_ON
            } else {
                0
            }
        })
        .collect();
    GrayFrame {
        data,
        width: a.width,
        height: a.height,
    }
}

/// One dilation pass with a full 3x3 structuring element.
fn dilate3x3(mask: &GrayFrame) -> GrayFrame {
    let width = mask.width as usize;
    let height = mask.height as usize;
    let mut out = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            if mask.data[y * width + x] != MASK_ON {
                continue;
            }
            let y_lo = y.saturating_sub(1);
            let y_hi = (y + 1).min(height - 1);
            let x_lo = x.saturating_sub(1);
            let x_hi = (x + 1).min(width - 1);
            for ny in y_lo..=y_hi {
                for nx in x_lo..=x_hi {
                    out[ny * width + nx] = MASK_ON;
                }
            }
        }
    }
    GrayFrame {
        data: out,
        width: mask.width,
        height: mask.height,
    }
}

/// Bounding rectangles of the 8-connected regions of the binary mask, in
/// raster discovery order. Equivalent to the upright bounding rectangles of
/// the mask's external contours.
fn bounding_boxes(mask: &GrayFrame) -> Vec<BoundingBox> {
    let width = mask.width as usize;
    let height = mask.height as usize;
    let mut visited = vec![false; width * height];
    let mut boxes = Vec::new();
    let mut stack = Vec::new();

    for start in 0..width * height {
        if mask.data[start] != MASK_ON || visited[start] {
            continue;
        }

        let (mut min_x, mut min_y) = (start % width, start / width);
        let (mut max_x, mut max_y) = (min_x, min_y);
        visited[start] = true;
        stack.push(start);

        while let Some(idx) = stack.pop() {
            let x = idx % width;
            let y = idx / width;
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);

            let y_lo = y.saturating_sub(1);
            let y_hi = (y + 1).min(height - 1);
            let x_lo = x.saturating_sub(1);
            let x_hi = (x + 1).min(width - 1);
            for ny in y_lo..=y_hi {
                for nx in x_lo..=x_hi {
                    let nidx = ny * width + nx;
                    if mask.data[nidx] == MASK_ON && !visited[nidx] {
                        visited[nidx] = true;
                        stack.push(nidx);
                    }
                }
            }
        }

        boxes.push(BoundingBox::new(
            min_x as u32,
            min_y as u32,
            (max_x - min_x + 1) as u32,
            (max_y - min_y + 1) as u32,
        ));
    }
    boxes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_frame(width: u32, height: u32, fill: u8) -> Frame {
        Frame::new(
            vec![fill; (width * height) as usize],
            width,
            height,
            1,
        )
        .unwrap()
    }

    /// Paint a rectangle of `value` onto a flat single-channel frame.
    fn with_patch(base: &Frame, patch: BoundingBox, value: u8) -> Frame {
        let mut frame = base.clone();
        let width = frame.width;
        let bytes = frame.as_bytes_mut();
        for y in patch.y..patch.y + patch.h {
            for x in patch.x..patch.x + patch.w {
                bytes[(y * width + x) as usize] = value;
            }
        }
        frame
    }

    #[test]
    fn first_frame_establishes_baseline_with_no_detections() {
        let mut detector = MotionDetector::new();
        let boxes = detector.process(&gray_frame(32, 32, 200)).unwrap();
        assert!(boxes.is_empty());
    }

    #[test]
    fn identical_frames_yield_no_motion() {
        let mut detector = MotionDetector::new();
        let frame = gray_frame(32, 32, 120);
        detector.process(&frame).unwrap();
        assert!(detector.process(&frame).unwrap().is_empty());
    }

    #[test]
    fn rectangular_delta_yields_one_box_within_dilation_tolerance() {
        let mut detector = MotionDetector::new();
        let base = gray_frame(64, 64, 10);
        let patch = BoundingBox::new(20, 24, 8, 6);
        detector.process(&base).unwrap();
        let boxes = detector.process(&with_patch(&base, patch, 200)).unwrap();

        assert_eq!(boxes.len(), 1);
        let b = boxes[0];
        // Two 3x3 dilation passes grow each side by at most 2 pixels.
        assert!(b.x >= patch.x - DILATE_ITERATIONS && b.x <= patch.x);
        assert!(b.y >= patch.y - DILATE_ITERATIONS && b.y <= patch.y);
        assert!(b.w >= patch.w && b.w <= patch.w + 2 * DILATE_ITERATIONS);
        assert!(b.h >= patch.h && b.h <= patch.h + 2 * DILATE_ITERATIONS);
    }

    #[test]
    fn threshold_is_strict() {
        let mut detector = MotionDetector::new();
        let base = gray_frame(32, 32, 100);
        detector.process(&base).unwrap();

        // Delta of exactly MOTION_THRESHOLD is not motion.
        let at = gray_frame(32, 32, 100 + MOTION_THRESHOLD);
        assert!(detector.process(&at).unwrap().is_empty());

        // One more unit is. The baseline slid, so the delta is now 1; start
        // over with a fresh detector instead.
        let mut detector = MotionDetector::new();
        detector.process(&base).unwrap();
        let above = gray_frame(32, 32, 100 + MOTION_THRESHOLD + 1);
        assert_eq!(detector.process(&above).unwrap().len(), 1);
    }

    #[test]
    fn baseline_slides_one_frame() {
        let mut detector = MotionDetector::new();
        let a = gray_frame(32, 32, 10);
        let b = gray_frame(32, 32, 200);
        detector.process(&a).unwrap();
        assert!(!detector.process(&b).unwrap().is_empty());
        // b is now the baseline; repeating b is motionless.
        assert!(detector.process(&b).unwrap().is_empty());
    }

    #[test]
    fn two_separated_patches_yield_two_boxes_in_raster_order() {
        let mut detector = MotionDetector::new();
        let base = gray_frame(64, 64, 10);
        detector.process(&base).unwrap();

        let upper = BoundingBox::new(4, 4, 6, 6);
        let lower = BoundingBox::new(40, 40, 6, 6);
        let frame = with_patch(&with_patch(&base, upper, 200), lower, 200);
        let boxes = detector.process(&frame).unwrap();

        assert_eq!(boxes.len(), 2);
        assert!(boxes[0].y < boxes[1].y);
    }

    #[test]
    fn adjacent_patches_merge_under_dilation() {
        let mut detector = MotionDetector::new();
        let base = gray_frame(64, 64, 10);
        detector.process(&base).unwrap();

        // Two patches separated by a 3-pixel gap; two dilation passes close
        // gaps of up to 4 pixels between mask regions.
        let left = BoundingBox::new(10, 10, 6, 6);
        let right = BoundingBox::new(19, 10, 6, 6);
        let frame = with_patch(&with_patch(&base, left, 200), right, 200);
        let boxes = detector.process(&frame).unwrap();
        assert_eq!(boxes.len(), 1);
    }

    #[test]
    fn extent_change_is_fatal() {
        let mut detector = MotionDetector::new();
        detector.process(&gray_frame(32, 32, 10)).unwrap();
        assert!(detector.process(&gray_frame(16, 16, 10)).is_err());
    }

    #[test]
    fn reset_clears_the_baseline() {
        let mut detector = MotionDetector::new();
        let a = gray_frame(32, 32, 10);
        let b = gray_frame(32, 32, 200);
        detector.process(&a).unwrap();
        detector.reset();
        // b is a first frame again.
        assert!(detector.process(&b).unwrap().is_empty());
    }
}
