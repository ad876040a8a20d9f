use std::fs::{self, File};
use std::path::Path;

use anyhow::{ensure, Context, Result};
use image::{codecs::png::PngEncoder, ColorType, ImageEncoder};
use nbn_formats::Raster;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct PreviewStats {
    pub width: u32,
    pub height: u32,
    pub mean_luma: f32,
    pub black_pixels: usize,
}

/// Writes the raster as an 8-bit RGB PNG and returns a few brightness stats.
pub fn dump_raster_to_png(raster: &Raster, destination: &Path) -> Result<PreviewStats> {
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }

    let data = raster.to_rgb_bytes();
    let expected_len = (raster.width() as usize)
        .checked_mul(raster.height() as usize)
        .and_then(|pixels| pixels.checked_mul(3))
        .context("preview size overflows")?;
    ensure!(
        data.len() == expected_len,
        "RGB buffer size {} does not match dimensions {}x{}",
        data.len(),
        raster.width(),
        raster.height()
    );

    let file = File::create(destination)
        .with_context(|| format!("creating {}", destination.display()))?;
    let encoder = PngEncoder::new(file);
    encoder
        .write_image(&data, raster.width(), raster.height(), ColorType::Rgb8.into())
        .with_context(|| format!("encoding PNG {}", destination.display()))?;

    Ok(compute_stats(raster))
}

fn compute_stats(raster: &Raster) -> PreviewStats {
    let mut sum_luma = 0f64;
    let mut black_pixels = 0usize;
    for px in raster.pixels() {
        let luma = 0.299 * px.r as f64 + 0.587 * px.g as f64 + 0.114 * px.b as f64;
        sum_luma += luma;
        if px.r == 0 && px.g == 0 && px.b == 0 {
            black_pixels += 1;
        }
    }
    let total = raster.pixels().len().max(1) as f64;
    PreviewStats {
        width: raster.width(),
        height: raster.height(),
        mean_luma: (sum_luma / total) as f32,
        black_pixels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_png_with_raster_size() {
        let raster = Raster::decode(&[0xFF, 0x7F, 0x00, 0x00], 2, 1).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("preview.png");

        let stats = dump_raster_to_png(&raster, &path).unwrap();
        assert_eq!((stats.width, stats.height), (2, 1));
        assert_eq!(stats.black_pixels, 1);

        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
