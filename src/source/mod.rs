//! Frame acquisition.
//!
//! This module resolves a video identifier to a decode backend and yields
//! frames in source order:
//! - `stub://<name>` synthetic streams (tests, demos)
//! - directories of image files, decoded via the `image` crate
//! - real container/codec decode via FFmpeg (feature: decode-ffmpeg)
//!
//! A source performs exactly one resource acquisition when opened and one
//! matching release when dropped, on both the success and failure path.
//! Decode ordering is the pipeline's ordering: the detector's correctness
//! depends on frames arriving in capture order.

mod file;
#[cfg(feature = "decode-ffmpeg")]
pub(crate) mod file_ffmpeg;
mod stub;

pub use file::{FrameSource, SourceConfig, SourceStats};
