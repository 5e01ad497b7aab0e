use super::CaptureSource;
use anyhow::{Context, Result};
use image::imageops::flip_horizontal_in_place;
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::Camera;

/// nokhwa-backed camera that yields horizontally mirrored RGB frames
pub struct WebcamCapture {
    camera: Camera,
    width: u32,
    height: u32,
}

impl WebcamCapture {
    pub fn new(device_index: u32, width: u32, height: u32) -> Result<Self> {
        tracing::info!(
            "Initializing webcam {} at {}x{}",
            device_index,
            width,
            height
        );

        let index = CameraIndex::Index(device_index);
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::HighestResolution(
            Resolution::new(width, height),
        ));

        let mut camera = Camera::new(index, requested).context("Failed to open camera")?;
        camera.open_stream().context("Failed to open camera stream")?;

        let resolution = camera.resolution();
        if (resolution.width(), resolution.height()) != (width, height) {
            tracing::warn!(
                "Camera negotiated {}x{} instead of {}x{}",
                resolution.width(),
                resolution.height(),
                width,
                height
            );
        }

        tracing::info!("Webcam initialized successfully");

        Ok(Self {
            camera,
            width: resolution.width(),
            height: resolution.height(),
        })
    }
}

impl CaptureSource for WebcamCapture {
    fn capture_frame(&mut self) -> Result<RgbImage> {
        let frame = self.camera.frame().context("Failed to capture frame")?;

        let mut decoded = frame
            .decode_image::<RgbFormat>()
            .context("Failed to decode frame")?;

        flip_horizontal_in_place(&mut decoded);
        Ok(decoded)
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Drop for WebcamCapture {
    fn drop(&mut self) {
        match self.camera.stop_stream() {
            Ok(()) => tracing::info!("Camera stream released"),
            Err(e) => tracing::warn!("Failed to stop camera stream: {}", e),
        }
    }
}
