//! GPU-free still frames evaluated with the CPU reference field.

use std::path::Path;

use anyhow::{Context, Result};
use image::{Rgb as Pixel, RgbImage};

use crate::field::{shade, ShadeInput, Vec2};
use crate::types::Palette;

/// Renders one frame at `time` seconds. Row 0 of the image is the top of
/// the view, as on screen.
pub fn render_still(palette: &Palette, width: u32, height: u32, time: f32) -> RgbImage {
    let width = width.max(1);
    let height = height.max(1);
    let resolution = Vec2::new(width as f32, height as f32);

    RgbImage::from_fn(width, height, |x, y| {
        let frag_coord = Vec2::new(x as f32 + 0.5, (height - 1 - y) as f32 + 0.5);
        let color = shade(ShadeInput {
            frag_coord,
            resolution,
            time,
            palette,
            reveal: 1.0,
        });
        Pixel(color.map(to_byte))
    })
}

/// Renders with [`render_still`] and writes the result as a PNG.
pub fn write_still_png(
    path: &Path,
    palette: &Palette,
    width: u32,
    height: u32,
    time: f32,
) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let image = render_still(palette, width, height, time);
    image
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("failed to write still frame to {}", path.display()))?;
    tracing::info!(path = %path.display(), width, height, time, "wrote still frame");
    Ok(())
}

fn to_byte(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}
