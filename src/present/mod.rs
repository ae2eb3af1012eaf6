//! Annotated frame presentation.
//!
//! The presenter is the terminal pipeline stage. For each frame it draws
//! detection outlines, optionally blurs the detected regions, overlays a
//! wall-clock timestamp, and hands the composited frame to a `RenderSink`.
//! Rendering failures are logged and skipped; they never stop the stage.

pub mod draw;

use anyhow::Result;
use chrono::Local;

use crate::frame::{BoundingBox, Frame};

/// Timestamp overlay anchor.
const TIMESTAMP_ANCHOR: (u32, u32) = (10, 30);
const TIMESTAMP_SCALE: u32 = 3;

/// Where composited frames go.
///
/// The sink is the seam between the pipeline and the display layer: a real
/// deployment plugs in a window or encoder surface, headless runs and tests
/// plug in a recording or null sink. Sinks run on the presenter thread.
pub trait RenderSink: Send {
    /// Display one composited frame.
    fn present(&mut self, frame: &Frame) -> Result<()>;

    /// Release display resources. Called exactly once, after the last frame.
    fn close(&mut self) {}
}

/// Sink for headless runs. Counts frames and logs at debug.
#[derive(Default)]
pub struct NullSink {
    frames: u64,
}

impl RenderSink for NullSink {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        self.frames += 1;
        log::debug!(
            "frame #{}: {}x{} rendered (null sink)",
            self.frames,
            frame.width,
            frame.height
        );
        Ok(())
    }

    fn close(&mut self) {
        log::info!("null sink closed after {} frames", self.frames);
    }
}

/// Terminal stage: composites detections onto frames and renders them.
pub struct Presenter {
    enable_blurring: bool,
    sink: Box<dyn RenderSink>,
}

impl Presenter {
    pub fn new(enable_blurring: bool, sink: Box<dyn RenderSink>) -> Self {
        log::info!("presenter initialized, blurring={}", enable_blurring);
        Self {
            enable_blurring,
            sink,
        }
    }

    /// Composite and render one frame. Annotation cannot fail; only the
    /// sink can, and the caller treats that as message-local.
    pub fn render(&mut self, mut frame: Frame, detections: &[BoundingBox]) -> Result<()> {
        for &bbox in detections {
            draw::draw_outline(&mut frame, bbox);
            if self.enable_blurring {
                draw::blur_region(&mut frame, bbox);
            }
        }

        // Wall-clock render time, not capture time.
        let timestamp = Local::now().format("%H:%M:%S").to_string();
        draw::draw_text(
            &mut frame,
            &timestamp,
            TIMESTAMP_ANCHOR.0,
            TIMESTAMP_ANCHOR.1,
            TIMESTAMP_SCALE,
        );

        self.sink.present(&frame)
    }

    /// Release the sink. Called when the stage stops.
    pub fn close(&mut self) {
        self.sink.close();
    }
}
