use std::fmt;
use std::str::FromStr;

use byteorder::{ByteOrder, LittleEndian};
use log::debug;
use serde::Serialize;

use crate::error::{EditError, Result};
use crate::pixel::{BYTES_PER_PIXEL, PixelWord, Raster, Rgb8};

/// Interpreted size of a raw buffer. Both sides are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Dimensions {
    width: u32,
    height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(EditError::InvalidDimensions(format!("{width}x{height}")));
        }
        Ok(Dimensions { width, height })
    }

    /// Near-square layout for a buffer of `byte_len` bytes: the width is the
    /// integer square root of the pixel count and the height rounds up, so the
    /// grid may hold a few more pixels than the buffer.
    pub fn derive(byte_len: usize) -> Option<Self> {
        let total_pixels = byte_len / BYTES_PER_PIXEL;
        if total_pixels == 0 {
            return None;
        }
        let width = total_pixels.isqrt();
        let height = total_pixels.div_ceil(width);
        Some(Dimensions {
            width: u32::try_from(width).ok()?,
            height: u32::try_from(height).ok()?,
        })
    }

    pub fn width(self) -> u32 {
        self.width
    }

    pub fn height(self) -> u32 {
        self.height
    }

    pub fn pixel_count(self) -> Option<usize> {
        (self.width as usize).checked_mul(self.height as usize)
    }

    pub fn contains(self, x: i64, y: i64) -> bool {
        (0..self.width as i64).contains(&x) && (0..self.height as i64).contains(&y)
    }

    fn byte_index(self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Dimensions {
    type Err = EditError;

    /// Accepts `"WIDTHxHEIGHT"` (also `X` or `,` as separator).
    fn from_str(text: &str) -> Result<Self> {
        let invalid = || EditError::InvalidDimensions(text.to_string());
        let (w, h) = text
            .trim()
            .split_once(['x', 'X', ','])
            .ok_or_else(invalid)?;
        let width = w.trim().parse::<u32>().map_err(|_| invalid())?;
        let height = h.trim().parse::<u32>().map_err(|_| invalid())?;
        Dimensions::new(width, height)
    }
}

/// Raw pixel buffer plus its decoded RGB view.
///
/// The buffer is the source of truth. The raster is rebuilt lazily and every
/// write goes through [`Canvas::write_raw_and_rgb`], which patches both sides
/// together.
#[derive(Debug, Clone, Default)]
pub struct Canvas {
    raw: Vec<u8>,
    dimensions: Option<Dimensions>,
    raster: Option<Raster>,
}

impl Canvas {
    pub fn new(raw: Vec<u8>) -> Self {
        Canvas {
            raw,
            dimensions: None,
            raster: None,
        }
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn dimensions(&self) -> Option<Dimensions> {
        self.dimensions
    }

    /// Replaces the buffer. Dimensions are kept; the raster is rebuilt on
    /// next access.
    pub fn load(&mut self, raw: Vec<u8>) {
        self.raw = raw;
        self.raster = None;
    }

    /// Replaces the buffer with an undo snapshot and recomputes the raster in
    /// full.
    pub fn restore(&mut self, snapshot: Vec<u8>) {
        self.raw = snapshot;
        // Left unset on allocation failure; the next raster() call retries.
        self.raster = self
            .dimensions
            .and_then(|dims| Raster::decode(&self.raw, dims.width(), dims.height()).ok());
    }

    /// Callers owning a scrolled view should reset it after this succeeds.
    ///
    /// A grid too large to decode is rejected and the previous dimensions
    /// stay in place.
    pub fn set_dimensions(&mut self, width: u32, height: u32) -> Result<Dimensions> {
        let dimensions = Dimensions::new(width, height)?;
        let raster = Raster::decode(&self.raw, width, height)?;
        self.dimensions = Some(dimensions);
        self.raster = Some(raster);
        debug!("canvas dimensions set to {dimensions}");
        Ok(dimensions)
    }

    pub fn reset_dimensions(&mut self) {
        self.dimensions = None;
        self.raster = None;
    }

    pub fn ensure_dimensions(&mut self) -> Result<Dimensions> {
        if let Some(dimensions) = self.dimensions {
            return Ok(dimensions);
        }
        let dimensions = Dimensions::derive(self.raw.len()).ok_or(EditError::NoData)?;
        debug!(
            "derived {dimensions} from {} byte buffer",
            self.raw.len()
        );
        self.dimensions = Some(dimensions);
        Ok(dimensions)
    }

    pub fn raster(&mut self) -> Result<&Raster> {
        let dimensions = self.ensure_dimensions()?;
        let raster = match self.raster.take() {
            Some(raster) => raster,
            None => Raster::decode(&self.raw, dimensions.width(), dimensions.height())?,
        };
        let raster: &Raster = self.raster.insert(raster);
        Ok(raster)
    }

    /// Colour at `(x, y)`, or `None` outside the grid. Grid cells past the end
    /// of the buffer read as black.
    pub fn read_pixel(&self, x: i64, y: i64) -> Option<Rgb8> {
        self.read_word(x, y).map(PixelWord::to_rgb8)
    }

    pub fn read_word(&self, x: i64, y: i64) -> Option<PixelWord> {
        let dimensions = self.dimensions?;
        if !dimensions.contains(x, y) {
            return None;
        }
        let index = dimensions.byte_index(x as u32, y as u32);
        Some(match self.raw.get(index..index + BYTES_PER_PIXEL) {
            Some(bytes) => PixelWord::new(LittleEndian::read_u16(bytes)),
            None => PixelWord::BLACK,
        })
    }

    /// Writes `word` to the buffer and the raster at `(x, y)`.
    ///
    /// Returns `false` without touching anything when the coordinate is
    /// outside the grid or the grid cell has no backing bytes in the buffer.
    pub fn write_raw_and_rgb(&mut self, x: i64, y: i64, word: PixelWord) -> bool {
        let Some(dimensions) = self.dimensions else {
            return false;
        };
        if !dimensions.contains(x, y) {
            return false;
        }
        let (x, y) = (x as u32, y as u32);
        let index = dimensions.byte_index(x, y);
        let Some(slot) = self.raw.get_mut(index..index + BYTES_PER_PIXEL) else {
            return false;
        };
        LittleEndian::write_u16(slot, word.raw());
        if let Some(raster) = self.raster.as_mut() {
            raster.set(x, y, word.to_rgb8());
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(values: &[u16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn derives_near_square_dimensions() {
        assert_eq!(Dimensions::derive(32), Some(Dimensions::new(4, 4).unwrap()));
        // 10 pixels: width 3, height ceil(10 / 3) = 4.
        assert_eq!(Dimensions::derive(20), Some(Dimensions::new(3, 4).unwrap()));
        // Odd trailing byte is ignored: 5 bytes -> 2 pixels -> 1x2.
        assert_eq!(Dimensions::derive(5), Some(Dimensions::new(1, 2).unwrap()));
        assert_eq!(Dimensions::derive(1), None);
        assert_eq!(Dimensions::derive(0), None);
    }

    #[test]
    fn rejects_non_positive_dimensions() {
        assert!(matches!(
            Dimensions::new(0, 4),
            Err(EditError::InvalidDimensions(_))
        ));
        assert!(matches!(
            "-3x4".parse::<Dimensions>(),
            Err(EditError::InvalidDimensions(_))
        ));
        assert!("320x0".parse::<Dimensions>().is_err());
        assert!("320".parse::<Dimensions>().is_err());
        assert_eq!(
            "320x240".parse::<Dimensions>().unwrap(),
            Dimensions::new(320, 240).unwrap()
        );
    }

    #[test]
    fn failed_set_dimensions_keeps_previous_size() {
        let mut canvas = Canvas::new(words(&[0; 8]));
        canvas.set_dimensions(4, 2).unwrap();
        assert!(canvas.set_dimensions(0, 2).is_err());
        assert_eq!(canvas.dimensions(), Dimensions::new(4, 2).ok());
    }

    #[test]
    fn oversized_dimensions_are_rejected_without_panicking() {
        let mut canvas = Canvas::new(words(&[0x7FFF; 16]));
        canvas.set_dimensions(4, 4).unwrap();
        canvas.raster().unwrap();

        let result = canvas.set_dimensions(u32::MAX, u32::MAX);
        assert!(matches!(result, Err(EditError::InvalidDimensions(_))));
        assert_eq!(canvas.dimensions(), Dimensions::new(4, 4).ok());
        let raster = canvas.raster().unwrap();
        assert_eq!((raster.width(), raster.height()), (4, 4));
        assert_eq!(raster.get(3, 3), Some(Rgb8::new(248, 248, 248)));
    }

    #[test]
    fn raster_pads_synthesised_pixels_black() {
        let mut canvas = Canvas::new(words(&[0x7FFF, 0x7FFF, 0x7FFF]));
        let dims = canvas.ensure_dimensions().unwrap();
        assert_eq!((dims.width(), dims.height()), (1, 3));

        canvas.set_dimensions(2, 2).unwrap();
        let raster = canvas.raster().unwrap();
        assert_eq!(raster.get(0, 1), Some(Rgb8::new(248, 248, 248)));
        assert_eq!(raster.get(1, 1), Some(Rgb8::BLACK));
    }

    #[test]
    fn write_updates_buffer_and_raster_together() {
        let mut canvas = Canvas::new(words(&[0; 4]));
        canvas.set_dimensions(2, 2).unwrap();

        assert!(canvas.write_raw_and_rgb(1, 1, PixelWord::new(0x03E0)));
        assert_eq!(&canvas.raw()[6..8], &[0xE0, 0x03]);
        assert_eq!(canvas.read_pixel(1, 1), Some(Rgb8::new(0, 248, 0)));
        assert_eq!(
            canvas.raster().unwrap().get(1, 1),
            Some(Rgb8::new(0, 248, 0))
        );
    }

    #[test]
    fn out_of_bounds_writes_are_ignored() {
        let mut canvas = Canvas::new(words(&[0; 4]));
        canvas.set_dimensions(2, 2).unwrap();
        let before = canvas.raw().to_vec();

        assert!(!canvas.write_raw_and_rgb(-1, 0, PixelWord::new(0x7FFF)));
        assert!(!canvas.write_raw_and_rgb(2, 0, PixelWord::new(0x7FFF)));
        assert!(!canvas.write_raw_and_rgb(0, 2, PixelWord::new(0x7FFF)));
        assert_eq!(canvas.raw(), &before[..]);
        assert_eq!(canvas.read_pixel(2, 0), None);
    }

    #[test]
    fn cells_without_backing_bytes_stay_untouched() {
        // 3 bytes: one full word and a dangling byte, laid out as 2x1.
        let mut canvas = Canvas::new(vec![0, 0, 0xAA]);
        canvas.set_dimensions(2, 1).unwrap();

        assert!(!canvas.write_raw_and_rgb(1, 0, PixelWord::new(0x7FFF)));
        assert_eq!(canvas.raw(), &[0, 0, 0xAA]);
        assert_eq!(canvas.raster().unwrap().get(1, 0), Some(Rgb8::BLACK));
    }

    #[test]
    fn load_keeps_dimensions_and_refreshes_raster() {
        let mut canvas = Canvas::new(words(&[0; 4]));
        canvas.set_dimensions(4, 1).unwrap();
        canvas.raster().unwrap();

        canvas.load(words(&[0x001F; 4]));
        assert_eq!(canvas.dimensions(), Dimensions::new(4, 1).ok());
        assert_eq!(
            canvas.raster().unwrap().get(3, 0),
            Some(Rgb8::new(0, 0, 248))
        );
    }
}
