use anyhow::{Context, Result};
use aura_cloak::capture::{CaptureSource, WebcamCapture};
use aura_cloak::cloak::{CloakParams, CloakPipeline, HsvRange, Preset, DEFAULT_WARMUP_FRAMES};
use aura_cloak::control::spawn_stdin_control;
use aura_cloak::driver::{report_capture, run_pipeline, LoopOptions};
use aura_cloak::output::{OutputSink, V4L2Output, DISPLAY_HEIGHT, DISPLAY_WIDTH};
use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input webcam device index
    #[arg(short, long, default_value_t = 0)]
    input_device: u32,

    /// Output v4l2loopback device path
    #[arg(short, long, default_value = "/dev/video10")]
    output_device: String,

    /// Capture resolution width
    #[arg(long, default_value_t = 640)]
    capture_width: u32,

    /// Capture resolution height
    #[arg(long, default_value_t = 480)]
    capture_height: u32,

    /// Output resolution width
    #[arg(long, default_value_t = DISPLAY_WIDTH)]
    output_width: u32,

    /// Output resolution height
    #[arg(long, default_value_t = DISPLAY_HEIGHT)]
    output_height: u32,

    /// Delay between ticks in milliseconds
    #[arg(long, default_value_t = 10)]
    tick_ms: u64,

    /// Frames discarded before a background capture
    #[arg(long, default_value_t = DEFAULT_WARMUP_FRAMES)]
    warmup_frames: u32,

    /// Starting color band
    #[arg(long, value_enum, default_value_t = Preset::Green)]
    preset: Preset,

    /// Override the preset's lower hue (0-180)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=180))]
    hue_low: Option<u8>,

    /// Override the preset's upper hue (0-180)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=180))]
    hue_high: Option<u8>,

    /// Override the preset's minimum saturation
    #[arg(long)]
    sat_low: Option<u8>,

    /// Override the preset's minimum brightness
    #[arg(long)]
    val_low: Option<u8>,

    /// Extra dilation passes around the cloak (0-15)
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(0..=15))]
    edge_growth: u32,

    /// Feathering kernel size (0-61, even values are rounded up)
    #[arg(long, default_value_t = 25, value_parser = clap::value_parser!(u32).range(0..=61))]
    feather: u32,

    /// Capture the background before the first frame
    #[arg(long)]
    capture_on_start: bool,

    /// Show matte visualization (grayscale alpha) instead of the composited video
    #[arg(long)]
    show_matte: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn initial_params(&self) -> CloakParams {
        let preset = self.preset.range();
        CloakParams {
            range: HsvRange::new(
                self.hue_low.unwrap_or(preset.hue_low),
                self.hue_high.unwrap_or(preset.hue_high),
                self.sat_low.unwrap_or(preset.sat_low),
                self.val_low.unwrap_or(preset.val_low),
            ),
            edge_growth: self.edge_growth,
            feather: self.feather,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let params = args.initial_params();

    tracing::info!("Aura Cloak starting");
    tracing::info!("Capture: {}x{}", args.capture_width, args.capture_height);
    tracing::info!("Output: {}x{}", args.output_width, args.output_height);
    tracing::info!("Tick interval: {}ms", args.tick_ms);
    tracing::info!("Initial parameters: {:?}", params);

    // Device failures surface here, before the loop starts
    let mut capture = WebcamCapture::new(
        args.input_device,
        args.capture_width,
        args.capture_height,
    )
    .context("Failed to initialize webcam capture")?;
    let (width, height) = capture.resolution();
    tracing::info!("Capturing at {}x{}", width, height);

    let mut output = V4L2Output::new(&args.output_device, args.output_width, args.output_height)
        .context("Failed to initialize v4l2loopback output")?;
    let (width, height) = output.resolution();
    tracing::info!("Writing {}x{} frames to {}", width, height, args.output_device);

    let controls = spawn_stdin_control().context("Failed to start control reader")?;

    let mut pipeline = CloakPipeline::new();
    if args.capture_on_start {
        report_capture(pipeline.capture_background(&mut capture, args.warmup_frames));
    } else {
        tracing::info!("No background yet, passing frames through (type `capture` to grab one)");
    }

    let options = LoopOptions {
        tick: Duration::from_millis(args.tick_ms),
        warmup_frames: args.warmup_frames,
        show_matte: args.show_matte,
    };

    run_pipeline(&mut capture, &mut output, &mut pipeline, params, &controls, options)?;

    tracing::info!("Aura Cloak stopped");
    Ok(())
}
