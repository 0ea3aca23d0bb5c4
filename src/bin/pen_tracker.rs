/**
 * Pen tracker binary
 *
 * Plays camera frames through the tracking pipeline and streams the pen
 * position to the connected peer, either through the radio co-processor on
 * a serial port or to stdout for bench runs.
 *
 * Keys: ESC/q - exit, c - recenter
 */

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use pen_tracker::camera::ImageSequenceCamera;
use pen_tracker::capture::{CaptureLoop, PipelineContext};
use pen_tracker::channel::{ConsoleLink, PeerLink, SerialLink};
use pen_tracker::config::TrackerConfig;
use pen_tracker::error::PipelineError;
use pen_tracker::input::{CommandSource, NoInput, TerminalInput};
use pen_tracker::vision::FisheyeCorrection;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args{
    /// Configuration file (TOML); defaults apply when missing
    #[arg(short, long, default_value = "pen_tracker.toml")]
    config: PathBuf,

    /// Directory of frames to play back
    #[arg(short, long)]
    frames: PathBuf,

    /// Serial port of the radio co-processor
    #[arg(short, long, default_value = "/dev/ttyACM0")]
    port: String,

    /// Serial baud rate (overrides the config file)
    #[arg(short, long)]
    baud: Option<u32>,

    /// Print chunks to stdout instead of using the radio
    #[arg(long)]
    console: bool,

    /// Errors only
    #[arg(short, long, conflicts_with_all = ["verbose", "debug"])]
    quiet: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Trace logging
    #[arg(short, long)]
    debug: bool,
}

impl Args{
    fn log_level(&self) -> &'static str{
        if self.quiet{
            "error"
        }else if self.debug{
            "trace"
        }else if self.verbose{
            "debug"
        } else{
            "info"
        }
    }
}

fn build_context(args: &Args, config: &TrackerConfig) -> Result<PipelineContext, PipelineError>{
    let camera = ImageSequenceCamera::open(&args.frames, &config.camera)
        .map_err(|e| PipelineError::ConfigurationFailure(format!("camera: {}", e)))?;

    let link: Box<dyn PeerLink> = if args.console{
        Box::new(ConsoleLink::stdout())
    } else{
        let baud = args.baud.unwrap_or(config.channel.baud_rate);
        let serial = SerialLink::open(&args.port, baud, &config.channel)
            .map_err(|e| PipelineError::ConfigurationFailure(format!("radio on {}: {}", args.port, e)))?;
        Box::new(serial)
    };

    let input: Box<dyn CommandSource> = match TerminalInput::new(){
        Ok(terminal) => Box::new(terminal),
        Err(e) =>{
            tracing::warn!("local keys disabled: {}", e);
            Box::new(NoInput)
        }
    };

    let mut context = PipelineContext::new(Box::new(camera), link, input);
    if config.correction.enabled{
        let correction =
            FisheyeCorrection::new(config.camera.width, config.camera.height, &config.correction);
        context = context.with_correction(Box::new(correction));
    }
    Ok(context)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()>{
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let config = TrackerConfig::load(&args.config)?;
    tracing::info!(
        "pen tracker: {}x{}, service {}",
        config.camera.width,
        config.camera.height,
        config.channel.service_uuid
    );

    let context = build_context(&args, &config).context("pipeline did not start")?;
    let mut capture = CaptureLoop::new(context, &config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move{
        if tokio::signal::ctrl_c().await.is_ok(){
            tracing::info!("interrupt received");
            let _ = shutdown_tx.send(true);
        }
    });

    let summary = capture.run(shutdown_rx).await?;
    tracing::info!(
        "done: {} cycles, {} samples, {} re-seeds, {} chunks sent",
        summary.cycles,
        summary.samples,
        summary.reseeds,
        summary.chunks_published
    );
    Ok(())
}
