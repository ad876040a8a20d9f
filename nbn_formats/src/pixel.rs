//! Packed 15bpp colour words and their 8-bit RGB expansion.
//!
//! A word keeps blue in bits 0-4, green in bits 5-9 and red in bits 10-14; bit
//! 15 is ignored. Expansion to 8 bits is a plain left shift by three, so the
//! low bits of every channel are always zero.

use std::fmt;
use std::str::FromStr;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{EditError, Result};

pub const BYTES_PER_PIXEL: usize = 2;

const CHANNEL_MASK: u16 = 0x1F;
const GREEN_SHIFT: u16 = 5;
const RED_SHIFT: u16 = 10;
const EXPAND_SHIFT: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelWord(u16);

impl PixelWord {
    pub const BLACK: PixelWord = PixelWord(0);

    pub const fn new(raw: u16) -> Self {
        PixelWord(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    pub fn from_le_bytes(bytes: [u8; 2]) -> Self {
        PixelWord(LittleEndian::read_u16(&bytes))
    }

    pub fn to_le_bytes(self) -> [u8; 2] {
        let mut out = [0u8; 2];
        LittleEndian::write_u16(&mut out, self.0);
        out
    }

    pub fn blue(self) -> u8 {
        (self.0 & CHANNEL_MASK) as u8
    }

    pub fn green(self) -> u8 {
        ((self.0 >> GREEN_SHIFT) & CHANNEL_MASK) as u8
    }

    pub fn red(self) -> u8 {
        ((self.0 >> RED_SHIFT) & CHANNEL_MASK) as u8
    }

    pub fn to_rgb8(self) -> Rgb8 {
        Rgb8 {
            r: self.red() << EXPAND_SHIFT,
            g: self.green() << EXPAND_SHIFT,
            b: self.blue() << EXPAND_SHIFT,
        }
    }

    /// Re-quantises an expanded colour back to 5 bits per channel. The unused
    /// high bit is always clear in the result.
    pub fn from_rgb8(rgb: Rgb8) -> Self {
        let r = (rgb.r >> EXPAND_SHIFT) as u16;
        let g = (rgb.g >> EXPAND_SHIFT) as u16;
        let b = (rgb.b >> EXPAND_SHIFT) as u16;
        PixelWord((r << RED_SHIFT) | (g << GREEN_SHIFT) | b)
    }
}

impl FromStr for PixelWord {
    type Err = EditError;

    fn from_str(text: &str) -> Result<Self> {
        encode_pixel(text)
    }
}

impl fmt::Display for PixelWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const BLACK: Rgb8 = Rgb8 { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb8 { r, g, b }
    }
}

/// Parses a colour typed as exactly four hex digits (`"7FFF"`, `"03e0"`).
///
/// The value is kept verbatim, including bit 15, so a painted pixel lands in
/// the buffer exactly as entered.
pub fn encode_pixel(color_hex: &str) -> Result<PixelWord> {
    if color_hex.len() != 4 || !color_hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(EditError::InvalidColor(color_hex.to_string()));
    }
    u16::from_str_radix(color_hex, 16)
        .map(PixelWord)
        .map_err(|_| EditError::InvalidColor(color_hex.to_string()))
}

/// Decodes `pixel_count` pixels from `buffer`.
///
/// Words are consumed in order; a dangling final byte is ignored and any
/// pixels the buffer cannot supply come back black. A count too large to
/// allocate is reported as `InvalidDimensions`.
pub fn decode(buffer: &[u8], pixel_count: usize) -> Result<Vec<Rgb8>> {
    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(pixel_count)
        .map_err(|_| EditError::InvalidDimensions(format!("{pixel_count} pixels")))?;
    pixels.extend(
        buffer
            .chunks_exact(BYTES_PER_PIXEL)
            .take(pixel_count)
            .map(|chunk| PixelWord(LittleEndian::read_u16(chunk)).to_rgb8()),
    );
    pixels.resize(pixel_count, Rgb8::BLACK);
    Ok(pixels)
}

/// Row-major RGB view of a canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<Rgb8>,
}

impl Raster {
    pub fn decode(buffer: &[u8], width: u32, height: u32) -> Result<Self> {
        let pixel_count = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| EditError::InvalidDimensions(format!("{width}x{height}")))?;
        let pixels = decode(buffer, pixel_count)
            .map_err(|_| EditError::InvalidDimensions(format!("{width}x{height}")))?;
        Ok(Raster {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Rgb8] {
        &self.pixels
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Rgb8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    pub(crate) fn set(&mut self, x: u32, y: u32, rgb: Rgb8) {
        let index = y as usize * self.width as usize + x as usize;
        if let Some(slot) = self.pixels.get_mut(index) {
            *slot = rgb;
        }
    }

    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 3);
        for px in &self.pixels {
            out.extend_from_slice(&[px.r, px.g, px.b]);
        }
        out
    }
}
