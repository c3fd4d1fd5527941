use serde::{Deserialize, Serialize};

use crate::error::EditError;

/// Bytes per RGBA pixel.
pub const CHANNELS: usize = 4;

/// Store a computed channel value the way an 8-bit clamped array does:
/// round half to even, then clamp to `0..=255`.
#[inline]
pub fn clamp_channel(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round_ties_even().clamp(0.0, 255.0) as u8
}

/// A single RGBA sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// HSL lightness in `0.0..=1.0`: the mean of the largest and smallest
    /// normalized channel.
    pub fn brightness(&self) -> f32 {
        let max = self.r.max(self.g).max(self.b) as f32 / 255.0;
        let min = self.r.min(self.g).min(self.b) as f32 / 255.0;
        (max + min) / 2.0
    }

    pub fn average(&self) -> f32 {
        (self.r as f32 + self.g as f32 + self.b as f32) / 3.0
    }
}

/// An opaque RGB color, written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or the short `#rgb` form (leading `#` optional).
    pub fn from_hex(hex: &str) -> Result<Self, EditError> {
        let invalid = || EditError::InvalidHexColor(hex.to_string());
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !digits.is_ascii() {
            return Err(invalid());
        }
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return Err(invalid()),
        };
        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn to_f32_array(&self, opacity: f32) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            opacity,
        ]
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self {
            r: 128,
            g: 128,
            b: 128,
        }
    }
}

/// A flat RGBA8 image buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// A transparent black buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * CHANNELS],
        }
    }

    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, EditError> {
        if width == 0 || height == 0 {
            return Err(EditError::EmptyImage);
        }
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(EditError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Read the pixel at a flattened pixel index.
    pub fn pixel(&self, index: usize) -> Color {
        let i = index * CHANNELS;
        Color::new(self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3])
    }

    pub fn pixel_at(&self, x: u32, y: u32) -> Color {
        self.pixel((y * self.width + x) as usize)
    }

    pub fn set_pixel(&mut self, index: usize, color: Color) {
        let i = index * CHANNELS;
        self.data[i..i + CHANNELS].copy_from_slice(&[color.r, color.g, color.b, color.a]);
    }

    /// Write red, green and blue, leaving alpha untouched.
    pub fn set_rgb(&mut self, index: usize, r: u8, g: u8, b: u8) {
        let i = index * CHANNELS;
        self.data[i] = r;
        self.data[i + 1] = g;
        self.data[i + 2] = b;
    }

    /// Overwrite this buffer with another of the same dimensions.
    pub fn copy_from(&mut self, other: &PixelBuffer) {
        debug_assert_eq!(self.data.len(), other.data.len());
        self.data.copy_from_slice(&other.data);
    }

    /// Copy the RGB channels of the masked pixels from `source`.
    pub fn copy_rgb_from(&mut self, source: &[u8], mask: &[u32]) {
        for &index in mask {
            let i = index as usize * CHANNELS;
            self.data[i..i + 3].copy_from_slice(&source[i..i + 3]);
        }
    }

    /// Copy all four channels of the masked pixels from `source`.
    pub fn copy_rgba_from(&mut self, source: &[u8], mask: &[u32]) {
        for &index in mask {
            let i = index as usize * CHANNELS;
            self.data[i..i + CHANNELS].copy_from_slice(&source[i..i + CHANNELS]);
        }
    }
}
