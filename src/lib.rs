//! AXON - concurrent motion detection pipeline.
//!
//! Three independently scheduled stages form a strictly linear pipeline:
//!
//! 1. **Frame Source** (`source`): decodes a video identifier into an
//!    in-order, finite frame sequence.
//! 2. **Motion Detector** (`detect`): frame differencing against a
//!    single-slot grayscale baseline; emits bounding boxes per frame.
//! 3. **Presenter** (`present`): draws outlines, optionally blurs detected
//!    regions, overlays a timestamp, and hands frames to a render sink.
//!
//! Stages communicate only by message passing over one-directional,
//! order-preserving channels; termination is an in-band `EndOfStream`
//! sentinel forwarded exactly once by every stage. See `pipeline` for the
//! protocol and its invariants.
//!
//! # Module structure
//!
//! - `frame`: pixel buffers and bounding boxes
//! - `source`: frame acquisition backends
//! - `detect`: the frame-differencing detector
//! - `present`: compositing and the render sink seam
//! - `pipeline`: messages, stage loops, orchestration
//! - `config`: file/env configuration

pub mod config;
pub mod detect;
pub mod frame;
pub mod pipeline;
pub mod present;
pub mod source;

pub use config::AxonConfig;
pub use detect::MotionDetector;
pub use frame::{BoundingBox, Frame, GrayFrame};
pub use pipeline::{run_pipeline, spawn_pipeline, PipelineHandle, PipelineMessage};
pub use present::{NullSink, Presenter, RenderSink};
pub use source::{FrameSource, SourceConfig};
