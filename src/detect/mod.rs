//! Motion detection by frame differencing.
//!
//! The detector keeps exactly one previous grayscale frame as its baseline
//! (a sliding one-frame window, not a background model) and produces a set
//! of bounding boxes per frame from the thresholded, dilated difference
//! image.

mod motion;

pub use motion::{MotionDetector, DILATE_ITERATIONS, MOTION_THRESHOLD};
