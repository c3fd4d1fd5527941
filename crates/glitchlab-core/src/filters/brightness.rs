use serde::{Deserialize, Serialize};

use super::{FilterContext, ParamRange};
use crate::pixel::{clamp_channel, PixelBuffer};

pub const INTENSITY: ParamRange = ParamRange::new(0.0, 2.0, 1.0);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrightnessConfig {
    /// Channel multiplier.
    pub intensity: f32,
}

impl Default for BrightnessConfig {
    fn default() -> Self {
        Self {
            intensity: INTENSITY.default,
        }
    }
}

pub fn apply(ctx: &mut FilterContext<'_>, config: &BrightnessConfig) {
    scale(ctx.buffer, ctx.mask, config.intensity);
}

/// Multiply red, green and blue of every masked pixel by `factor`.
pub(crate) fn scale(buffer: &mut PixelBuffer, mask: &[u32], factor: f32) {
    for &index in mask {
        let c = buffer.pixel(index as usize);
        buffer.set_rgb(
            index as usize,
            clamp_channel(c.r as f32 * factor),
            clamp_channel(c.g as f32 * factor),
            clamp_channel(c.b as f32 * factor),
        );
    }
}
