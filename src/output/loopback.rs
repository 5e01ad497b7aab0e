use super::OutputSink;
use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;
use std::borrow::Cow;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use v4l::video::Output;
use v4l::{Device, Format, FourCC};

/// Writes frames to a v4l2loopback device as packed YUYV
pub struct V4L2Output {
    file: File,
    width: u32,
    height: u32,
    buffer: Vec<u8>,
}

impl V4L2Output {
    pub fn new<P: AsRef<Path>>(device_path: P, width: u32, height: u32) -> Result<Self> {
        let path = device_path.as_ref();
        tracing::info!(
            "Opening v4l2loopback device at {} ({}x{})",
            path.display(),
            width,
            height
        );

        let device = Device::with_path(path)
            .with_context(|| format!("Failed to open v4l2 device at {}", path.display()))?;
        let requested = Format::new(width, height, FourCC::new(b"YUYV"));
        let negotiated = Output::set_format(&device, &requested)
            .context("Failed to set YUYV output format")?;
        tracing::debug!("Output format negotiated: {}", negotiated);

        let file = File::options()
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open v4l2loopback device at {}", path.display()))?;

        tracing::info!("v4l2loopback device opened successfully");

        Ok(Self {
            file,
            width,
            height,
            buffer: Vec::with_capacity((width * height * 2) as usize),
        })
    }
}

/// Pack an RGB frame as YUYV (4:2:2), sharing chroma between horizontal pixel pairs
fn pack_yuyv(frame: &RgbImage, out: &mut Vec<u8>) {
    out.clear();
    let width = frame.width() as usize;
    for row in frame.as_raw().chunks_exact(width * 3) {
        for pair in row.chunks(6) {
            let first = [pair[0], pair[1], pair[2]];
            // Odd widths repeat the last pixel
            let second = if pair.len() == 6 {
                [pair[3], pair[4], pair[5]]
            } else {
                first
            };

            let (y0, u0, v0) = rgb_to_yuv(first);
            let (y1, u1, v1) = rgb_to_yuv(second);
            out.extend_from_slice(&[
                y0,
                ((u0 as u16 + u1 as u16) / 2) as u8,
                y1,
                ((v0 as u16 + v1 as u16) / 2) as u8,
            ]);
        }
    }
}

/// BT.601 RGB to YUV
fn rgb_to_yuv([r, g, b]: [u8; 3]) -> (u8, u8, u8) {
    let (r, g, b) = (r as f32, g as f32, b as f32);

    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let u = -0.147 * r - 0.289 * g + 0.436 * b + 128.0;
    let v = 0.615 * r - 0.515 * g - 0.100 * b + 128.0;

    let to_byte = |x: f32| x.round().clamp(0.0, 255.0) as u8;
    (to_byte(y), to_byte(u), to_byte(v))
}

impl OutputSink for V4L2Output {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        let frame = if frame.dimensions() != (self.width, self.height) {
            Cow::Owned(imageops::resize(
                frame,
                self.width,
                self.height,
                FilterType::Triangle,
            ))
        } else {
            Cow::Borrowed(frame)
        };

        pack_yuyv(&frame, &mut self.buffer);

        self.file
            .write_all(&self.buffer)
            .context("Failed to write frame to v4l2loopback device")?;

        Ok(())
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn yuyv_is_two_bytes_per_pixel() {
        let frame = RgbImage::from_pixel(8, 4, Rgb([10, 20, 30]));
        let mut out = Vec::new();
        pack_yuyv(&frame, &mut out);
        assert_eq!(out.len(), 8 * 4 * 2);
    }

    #[test]
    fn odd_width_pads_each_row() {
        let frame = RgbImage::from_pixel(3, 2, Rgb([0, 0, 0]));
        let mut out = Vec::new();
        pack_yuyv(&frame, &mut out);
        assert_eq!(out.len(), 2 * 2 * 4);
    }

    #[test]
    fn grey_has_neutral_chroma() {
        assert_eq!(rgb_to_yuv([128, 128, 128]), (128, 128, 128));
        assert_eq!(rgb_to_yuv([255, 255, 255]).0, 255);
        assert_eq!(rgb_to_yuv([0, 0, 0]), (0, 128, 128));
    }
}
