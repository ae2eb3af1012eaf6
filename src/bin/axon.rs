//! axon - motion detection pipeline CLI.
//!
//! Opens the configured video source, runs the three-stage pipeline to
//! completion, and renders annotated frames to the configured sink.

use anyhow::Result;
use clap::Parser;

use axon_motion::{run_pipeline, AxonConfig, NullSink};

#[derive(Parser, Debug)]
#[command(name = "axon", about = "Motion detection pipeline (AXON)")]
struct Args {
    /// Video source: a file path, a directory of image frames, or stub://
    #[arg(short = 'v', long = "video", env = "AXON_SOURCE")]
    video: Option<String>,

    /// Blur detected regions.
    #[arg(short = 'b', long = "blurring", overrides_with = "no_blurring")]
    blurring: bool,

    /// Disable blurring of detected regions.
    #[arg(long = "no-blurring", overrides_with = "blurring")]
    no_blurring: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let blur_override = if args.blurring {
        Some(true)
    } else if args.no_blurring {
        Some(false)
    } else {
        None
    };
    let config = AxonConfig::load_with_overrides(args.video, blur_override)?;

    // There is no in-band abort: Ctrl-C is the abnormal-shutdown path and
    // terminates the whole process, stages included.
    ctrlc::set_handler(|| {
        log::warn!("interrupt received, terminating pipeline");
        std::process::exit(130);
    })?;

    log::info!(
        "axon starting: source={} blurring={}",
        config.source,
        config.enable_blurring
    );
    run_pipeline(&config, Box::new(NullSink::default()))
}
