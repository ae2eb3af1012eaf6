//! The three-stage frame pipeline.
//!
//! Frame Source -> Motion Detector -> Presenter, connected by two
//! order-preserving single-producer/single-consumer channels. Each stage is
//! an OS thread owning private state; the only communication is message
//! passing. `EndOfStream` is the sole in-band termination signal: every
//! stage forwards it exactly once, immediately on receipt, and sends
//! nothing afterwards.
//!
//! Channels are `std::sync::mpsc::channel()` and therefore unbounded: there
//! is no backpressure contract, so memory can grow without bound when the
//! presenter renders slower than the source decodes. This matches the
//! original system's pipe semantics and is deliberate.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::AxonConfig;
use crate::detect::MotionDetector;
use crate::frame::{BoundingBox, Frame};
use crate::present::{Presenter, RenderSink};
use crate::source::{FrameSource, SourceConfig};

/// One message on a stage-to-stage channel.
///
/// `Frame` carries a raw frame (source -> detector). `Detections` carries a
/// frame plus its detection set (detector -> presenter). `EndOfStream` is a
/// one-shot terminal sentinel: once sent, it is the last message ever sent
/// on that channel.
pub enum PipelineMessage {
    Frame(Frame),
    Detections(Frame, Vec<BoundingBox>),
    EndOfStream,
}

/// Handles for the three running stages, joined in upstream order.
pub struct PipelineHandle {
    source: JoinHandle<Result<()>>,
    detector: JoinHandle<Result<()>>,
    presenter: JoinHandle<Result<()>>,
}

impl PipelineHandle {
    /// Wait for all three stages. The first stage error wins; a panicked
    /// stage thread is reported as an error rather than propagated.
    pub fn join(self) -> Result<()> {
        let source = flatten_join("source", self.source);
        let detector = flatten_join("detector", self.detector);
        let presenter = flatten_join("presenter", self.presenter);
        source.and(detector).and(presenter)
    }
}

fn flatten_join(stage: &str, handle: JoinHandle<Result<()>>) -> Result<()> {
    match handle.join() {
        Ok(result) => result.with_context(|| format!("{} stage failed", stage)),
        Err(_) => Err(anyhow::anyhow!("{} stage panicked", stage)),
    }
}

/// Spawn the three stages and return their handles.
///
/// Validation of `config` must already have happened; an unopenable source
/// is not a spawn error but a normal (empty) run, observed downstream as an
/// immediate `EndOfStream`.
pub fn spawn_pipeline(config: &AxonConfig, sink: Box<dyn RenderSink>) -> Result<PipelineHandle> {
    let (frame_tx, frame_rx) = channel::<PipelineMessage>();
    let (detection_tx, detection_rx) = channel::<PipelineMessage>();

    let source_config = SourceConfig {
        identifier: config.source.clone(),
        target_fps: config.target_fps,
    };
    let source = thread::Builder::new()
        .name("axon-source".into())
        .spawn(move || source_stage(source_config, frame_tx))
        .context("spawn source thread")?;

    let detector = thread::Builder::new()
        .name("axon-detector".into())
        .spawn(move || detector_stage(frame_rx, detection_tx))
        .context("spawn detector thread")?;

    let enable_blurring = config.enable_blurring;
    let presenter = thread::Builder::new()
        .name("axon-presenter".into())
        .spawn(move || presenter_stage(detection_rx, enable_blurring, sink))
        .context("spawn presenter thread")?;

    Ok(PipelineHandle {
        source,
        detector,
        presenter,
    })
}

/// Run the pipeline to completion.
pub fn run_pipeline(config: &AxonConfig, sink: Box<dyn RenderSink>) -> Result<()> {
    spawn_pipeline(config, sink)?.join()
}

// ----------------------------------------------------------------------------
// Stage loops
// ----------------------------------------------------------------------------

/// Frame Source stage: decode frames in order, then signal end of stream.
///
/// Open failure and mid-stream decode failure both end the stream; either
/// way downstream observes exactly one `EndOfStream` and exits cleanly. A
/// send error means the receiver is gone, which only happens on abnormal
/// shutdown; the stage just stops producing.
fn source_stage(config: SourceConfig, tx: Sender<PipelineMessage>) -> Result<()> {
    let frame_interval = Duration::from_millis(1000 / config.target_fps.max(1) as u64);
    let mut source = match FrameSource::open(config) {
        Ok(source) => source,
        Err(e) => {
            log::error!("failed to open source: {:#}", e);
            let _ = tx.send(PipelineMessage::EndOfStream);
            return Ok(());
        }
    };

    loop {
        match source.next_frame() {
            Ok(Some(frame)) => {
                if tx.send(PipelineMessage::Frame(frame)).is_err() {
                    log::warn!("frame channel closed, stopping source");
                    break;
                }
                // Pace decode to the target rate. There is no backpressure
                // from downstream; this is the only throttle.
                thread::sleep(frame_interval);
            }
            Ok(None) => break,
            Err(e) => {
                // Decode failure is treated as end of stream, not retried.
                log::error!("frame decode failed: {:#}", e);
                break;
            }
        }
    }

    log::info!(
        "source finished after {} frames",
        source.stats().frames_decoded
    );
    let _ = tx.send(PipelineMessage::EndOfStream);
    Ok(())
}

/// Motion Detector stage: stateful transform over the frame stream.
///
/// Any single-frame processing failure is fatal to the stage. The error is
/// returned without forwarding `EndOfStream`; bounding the resulting
/// presenter wait is the orchestrator's responsibility.
fn detector_stage(rx: Receiver<PipelineMessage>, tx: Sender<PipelineMessage>) -> Result<()> {
    let mut detector = MotionDetector::new();

    loop {
        let message = match rx.recv() {
            Ok(message) => message,
            Err(_) => {
                // Sender dropped without a sentinel: abnormal upstream death.
                log::warn!("frame channel closed without end-of-stream");
                break;
            }
        };

        match message {
            PipelineMessage::Frame(frame) => {
                let detections = detector.process(&frame)?;
                if !detections.is_empty() {
                    log::debug!("frame has {} detections", detections.len());
                }
                if tx
                    .send(PipelineMessage::Detections(frame, detections))
                    .is_err()
                {
                    log::warn!("detection channel closed, stopping detector");
                    break;
                }
            }
            PipelineMessage::Detections(..) => {
                anyhow::bail!("detector received a detections message");
            }
            PipelineMessage::EndOfStream => break,
        }
    }

    detector.reset();
    let _ = tx.send(PipelineMessage::EndOfStream);
    log::info!("detector stopped");
    Ok(())
}

/// Presenter stage: terminal consumer. Render failures are message-local.
fn presenter_stage(
    rx: Receiver<PipelineMessage>,
    enable_blurring: bool,
    sink: Box<dyn RenderSink>,
) -> Result<()> {
    let mut presenter = Presenter::new(enable_blurring, sink);
    let mut rendered = 0u64;

    loop {
        let message = match rx.recv() {
            Ok(message) => message,
            Err(_) => {
                log::warn!("detection channel closed without end-of-stream");
                break;
            }
        };

        match message {
            PipelineMessage::Detections(frame, detections) => {
                match presenter.render(frame, &detections) {
                    Ok(()) => rendered += 1,
                    Err(e) => log::error!("render failed, skipping frame: {:#}", e),
                }
            }
            PipelineMessage::Frame(_) => {
                anyhow::bail!("presenter received a raw frame message");
            }
            PipelineMessage::EndOfStream => break,
        }
    }

    presenter.close();
    log::info!("presenter stopped after {} frames", rendered);
    Ok(())
}
