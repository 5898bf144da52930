//! Host-only PNG previews of what the panel would show.
//!
//! Each LED is drawn as a soft-edged disc on black, so a saved frame looks like the
//! physical 8×8 matrix rather than an 8-pixel thumbnail.
#![cfg(feature = "host")]

use std::error::Error;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use png::{BitDepth, ColorType, Encoder};

use crate::led2d::Frame2d;

/// Write `frame` as a PNG whose larger side is at most `max_dimension` pixels.
///
/// # Errors
///
/// Returns an error if the file cannot be created or encoded.
pub fn write_frame_png<const W: usize, const H: usize>(
    frame: &Frame2d<W, H>,
    output_path: impl AsRef<Path>,
    max_dimension: u32,
) -> Result<(), Box<dyn Error>> {
    let output_path = output_path.as_ref();
    let cell_size = cell_size_for(W, H, max_dimension)?;
    let (width, height, pixels) = render_panel(frame, cell_size);

    if let Some(parent) = output_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut encoder = Encoder::new(BufWriter::new(File::create(output_path)?), width, height);
    encoder.set_color(ColorType::Rgb);
    encoder.set_depth(BitDepth::Eight);
    encoder.write_header()?.write_image_data(&pixels)?;
    info!("wrote panel preview to {}", output_path.display());
    Ok(())
}

/// Write `frames` as a looping animated PNG, `frame_delay_ms` per frame.
///
/// # Errors
///
/// Returns an error for an empty frame list, or if the file cannot be created or encoded.
pub fn write_frames_apng<const W: usize, const H: usize>(
    frames: &[Frame2d<W, H>],
    output_path: impl AsRef<Path>,
    max_dimension: u32,
    frame_delay_ms: u16,
) -> Result<(), Box<dyn Error>> {
    if frames.is_empty() {
        return Err("no frames to write".into());
    }
    let output_path = output_path.as_ref();
    let cell_size = cell_size_for(W, H, max_dimension)?;
    let (width, height, _) = render_panel(&Frame2d::<W, H>::new(), cell_size);

    if let Some(parent) = output_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut encoder = Encoder::new(BufWriter::new(File::create(output_path)?), width, height);
    encoder.set_color(ColorType::Rgb);
    encoder.set_depth(BitDepth::Eight);
    encoder.set_animated(u32::try_from(frames.len())?, 0)?;
    let mut writer = encoder.write_header()?;
    for frame in frames {
        writer.set_frame_delay(frame_delay_ms, 1000)?;
        writer.write_image_data(&render_panel(frame, cell_size).2)?;
    }
    writer.finish()?;
    info!("wrote panel animation to {}", output_path.display());
    Ok(())
}

fn cell_size_for(width: usize, height: usize, max_dimension: u32) -> Result<u32, Box<dyn Error>> {
    let cells = u32::try_from(width.max(height))?;
    // One extra cell of border, half on each side.
    let cell_size = max_dimension / (cells + 1);
    if cell_size < 4 {
        return Err(format!("max_dimension {max_dimension} is too small for a {width}x{height} panel").into());
    }
    Ok(cell_size)
}

fn render_panel<const W: usize, const H: usize>(
    frame: &Frame2d<W, H>,
    cell_size: u32,
) -> (u32, u32, Vec<u8>) {
    let border = cell_size / 2;
    let width = W as u32 * cell_size + border * 2;
    let height = H as u32 * cell_size + border * 2;
    let mut pixels = vec![0u8; (width * height * 3) as usize];

    let radius = f64::from(cell_size) * 0.4;
    let solid_radius = radius * 0.7;
    let center = f64::from(cell_size) / 2.0;

    for (row_index, row) in frame.iter().enumerate() {
        for (column_index, led) in row.iter().enumerate() {
            let origin_x = border + column_index as u32 * cell_size;
            let origin_y = border + row_index as u32 * cell_size;
            for local_y in 0..cell_size {
                for local_x in 0..cell_size {
                    let dx = f64::from(local_x) + 0.5 - center;
                    let dy = f64::from(local_y) + 0.5 - center;
                    let distance = dx.hypot(dy);
                    if distance > radius {
                        continue;
                    }
                    let intensity = if distance <= solid_radius {
                        1.0
                    } else {
                        1.0 - (distance - solid_radius) / (radius - solid_radius)
                    };
                    let offset = (((origin_y + local_y) * width + origin_x + local_x) * 3) as usize;
                    for (channel_index, channel) in [led.r, led.g, led.b].into_iter().enumerate() {
                        pixels[offset + channel_index] = preview_level(channel, intensity);
                    }
                }
            }
        }
    }
    (width, height, pixels)
}

// LED drive levels are dim by screen standards; stretch them so previews stay readable.
fn preview_level(channel: u8, intensity: f64) -> u8 {
    let normalized = f64::from(channel) / 255.0;
    (normalized.sqrt() * intensity * 255.0).round().clamp(0.0, 255.0) as u8
}
