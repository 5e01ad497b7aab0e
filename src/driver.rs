use crate::capture::CaptureSource;
use crate::cloak::{alpha_to_rgb, CaptureOutcome, CloakParams, CloakPipeline};
use crate::control::ControlCommand;
use crate::output::OutputSink;
use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

/// Settings for the driving loop that do not change per tick
#[derive(Debug, Clone)]
pub struct LoopOptions {
    /// Minimum spacing between ticks
    pub tick: Duration,
    /// Frames discarded before a background capture
    pub warmup_frames: u32,
    /// Start with the grey alpha view instead of the composite
    pub show_matte: bool,
}

pub fn report_capture(outcome: CaptureOutcome) {
    match outcome {
        CaptureOutcome::Captured { width, height } => {
            tracing::info!("BG Captured ({}x{})", width, height)
        }
        CaptureOutcome::NoFrame => {
            tracing::warn!("Background not captured, keeping previous state")
        }
    }
}

/// Run ticks until `quit` arrives or the control channel closes
///
/// Each tick drains pending commands, reads one frame, composites it and writes the
/// result. A failed read skips the tick without writing anything.
pub fn run_pipeline<C, O>(
    capture: &mut C,
    output: &mut O,
    pipeline: &mut CloakPipeline,
    mut params: CloakParams,
    controls: &Receiver<ControlCommand>,
    options: LoopOptions,
) -> Result<()>
where
    C: CaptureSource,
    O: OutputSink,
{
    let mut show_matte = options.show_matte;
    let mut frame_count = 0u64;
    let mut dropped_frames = 0u64;
    let mut total_capture_time = Duration::ZERO;
    let mut total_cloak_time = Duration::ZERO;
    let mut total_output_time = Duration::ZERO;

    tracing::info!("Starting main pipeline loop");
    tracing::info!("Type `quit` or close stdin to stop");

    loop {
        let loop_start = Instant::now();

        // Parameters and capture requests only change between ticks
        loop {
            let command = match controls.try_recv() {
                Ok(command) => command,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::info!("Control input closed after {} frames", frame_count);
                    return Ok(());
                }
            };
            match command {
                ControlCommand::Quit => {
                    tracing::info!("Shutting down after {} frames", frame_count);
                    return Ok(());
                }
                ControlCommand::CaptureBackground => {
                    report_capture(pipeline.capture_background(capture, options.warmup_frames));
                }
                ControlCommand::ClearBackground => pipeline.clear_background(),
                ControlCommand::ToggleMatte => {
                    show_matte = !show_matte;
                    tracing::info!("Matte view {}", if show_matte { "on" } else { "off" });
                }
                ControlCommand::Show => tracing::info!(
                    "Parameters: {:?}, background: {}",
                    params,
                    pipeline.has_background()
                ),
                other => {
                    other.apply(&mut params);
                    tracing::debug!("Parameters updated: {:?}", params);
                }
            }
        }

        // Capture frame; a failed read skips this tick
        let capture_start = Instant::now();
        let frame = match capture.capture_frame() {
            Ok(frame) => frame,
            Err(e) => {
                dropped_frames += 1;
                tracing::debug!("Skipping tick: {:#}", e);
                sleep_remaining(loop_start, options.tick);
                continue;
            }
        };
        total_capture_time += capture_start.elapsed();

        let cloak_start = Instant::now();
        let tick = pipeline.process(frame, &params);
        total_cloak_time += cloak_start.elapsed();

        let output_frame = match (&tick.alpha, show_matte) {
            (Some(alpha), true) => alpha_to_rgb(alpha),
            _ => tick.frame,
        };

        let output_start = Instant::now();
        output
            .write_frame(&output_frame)
            .context("Failed to write frame")?;
        total_output_time += output_start.elapsed();

        frame_count += 1;

        // Log stats every 30 frames
        if frame_count % 30 == 0 {
            let avg_capture_ms = total_capture_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let avg_cloak_ms = total_cloak_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let avg_output_ms = total_output_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let total_ms = avg_capture_ms + avg_cloak_ms + avg_output_ms;
            let actual_fps = 1000.0 / total_ms;

            tracing::info!(
                "Frame {}: capture={:.1}ms, cloak={:.1}ms, output={:.1}ms, total={:.1}ms, fps={:.1}, dropped={}",
                frame_count,
                avg_capture_ms,
                avg_cloak_ms,
                avg_output_ms,
                total_ms,
                actual_fps,
                dropped_frames
            );
        }

        sleep_remaining(loop_start, options.tick);
    }
}

fn sleep_remaining(loop_start: Instant, tick: Duration) {
    let elapsed = loop_start.elapsed();
    if elapsed < tick {
        std::thread::sleep(tick - elapsed);
    }
}
