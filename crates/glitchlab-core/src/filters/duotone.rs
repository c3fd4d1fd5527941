use serde::{Deserialize, Serialize};

use super::brightness::scale;
use super::grayscale::desaturate;
use super::{FilterContext, ParamRange};
use crate::pixel::{clamp_channel, PixelBuffer, Rgb, CHANNELS};

pub const BRIGHTNESS: ParamRange = ParamRange::new(0.0, 2.0, 1.0);
pub const CONTRAST: ParamRange = ParamRange::new(0.0, 100.0, 0.0);

pub const DEFAULT_HIGHLIGHTS: Rgb = Rgb {
    r: 0xff,
    g: 0xef,
    b: 0xb3,
};
pub const DEFAULT_SHADOWS: Rgb = Rgb {
    r: 0x29,
    g: 0x09,
    b: 0x00,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DuotoneConfig {
    pub brightness: f32,
    pub contrast: f32,
    /// Multiplied over the toned image.
    pub highlights: Rgb,
    /// Floor for every channel (lighten blend).
    pub shadows: Rgb,
}

impl Default for DuotoneConfig {
    fn default() -> Self {
        Self {
            brightness: BRIGHTNESS.default,
            contrast: CONTRAST.default,
            highlights: DEFAULT_HIGHLIGHTS,
            shadows: DEFAULT_SHADOWS,
        }
    }
}

pub fn apply(ctx: &mut FilterContext<'_>, config: &DuotoneConfig) {
    scale(ctx.buffer, ctx.mask, config.brightness);
    desaturate(ctx.buffer, ctx.mask, 1.0);
    adjust_contrast(ctx.buffer, ctx.mask, config.contrast);

    let hi = config.highlights;
    let lo = config.shadows;
    let data = ctx.buffer.data_mut();
    for &index in ctx.mask {
        let i = index as usize * CHANNELS;
        let multiply = |v: u8, tone: u8| clamp_channel(v as f32 * tone as f32 / 255.0);
        data[i] = multiply(data[i], hi.r).max(lo.r);
        data[i + 1] = multiply(data[i + 1], hi.g).max(lo.g);
        data[i + 2] = multiply(data[i + 2], hi.b).max(lo.b);
    }
}

/// `contrast` is a percentage; 0 leaves pixels (almost exactly) unchanged.
fn adjust_contrast(buffer: &mut PixelBuffer, mask: &[u32], contrast: f32) {
    let c = contrast * 2.55;
    let factor = (255.0 + c) / (255.01 - c);
    let data = buffer.data_mut();
    for &index in mask {
        let i = index as usize * CHANNELS;
        for ch in i..i + 3 {
            data[ch] = clamp_channel(factor * (data[ch] as f32 - 128.0) + 128.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::test_support::{all_indices, gradient};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn run(buffer: &mut PixelBuffer, config: &DuotoneConfig) {
        let mask = all_indices(buffer);
        let mut rng = Pcg32::seed_from_u64(0);
        apply(
            &mut FilterContext {
                buffer,
                mask: &mask,
                refresh: false,
                rng: &mut rng,
            },
            config,
        );
    }

    #[test]
    fn test_white_and_black_map_to_tones() {
        let mut buffer = PixelBuffer::from_rgba(2, 1, vec![255, 255, 255, 255, 0, 0, 0, 128]).unwrap();
        run(&mut buffer, &DuotoneConfig::default());
        assert_eq!(buffer.data(), &[0xff, 0xef, 0xb3, 255, 0x29, 0x09, 0x00, 128]);
    }

    #[test]
    fn test_shadows_floor_every_channel() {
        let mut buffer = gradient(16, 16);
        let config = DuotoneConfig::default();
        run(&mut buffer, &config);
        for i in 0..buffer.pixel_count() {
            let c = buffer.pixel(i);
            assert!(c.r >= config.shadows.r && c.g >= config.shadows.g && c.b >= config.shadows.b);
        }
    }

    #[test]
    fn test_zero_contrast_is_near_identity() {
        let mut buffer = gradient(8, 8);
        let before = buffer.clone();
        let mask = all_indices(&buffer);
        adjust_contrast(&mut buffer, &mask, 0.0);
        assert_eq!(buffer, before);
    }

    #[test]
    fn test_full_contrast_pushes_to_extremes() {
        let mut buffer = PixelBuffer::from_rgba(2, 1, vec![100, 100, 100, 255, 160, 160, 160, 255]).unwrap();
        adjust_contrast(&mut buffer, &[0, 1], 100.0);
        assert_eq!(buffer.pixel(0).r, 0);
        assert_eq!(buffer.pixel(1).r, 255);
    }
}
