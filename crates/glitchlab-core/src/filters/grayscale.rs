use serde::{Deserialize, Serialize};

use super::{FilterContext, ParamRange};
use crate::pixel::{clamp_channel, PixelBuffer};

pub const INTENSITY: ParamRange = ParamRange::new(0.0, 1.0, 1.0);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrayscaleConfig {
    /// 0 leaves the pixel alone, 1 is fully desaturated.
    pub intensity: f32,
}

impl Default for GrayscaleConfig {
    fn default() -> Self {
        Self {
            intensity: INTENSITY.default,
        }
    }
}

pub fn apply(ctx: &mut FilterContext<'_>, config: &GrayscaleConfig) {
    desaturate(ctx.buffer, ctx.mask, config.intensity);
}

/// Blend each masked pixel towards its channel average. Alpha is untouched.
pub(crate) fn desaturate(buffer: &mut PixelBuffer, mask: &[u32], intensity: f32) {
    for &index in mask {
        let color = buffer.pixel(index as usize);
        let avg = color.average();
        let mix = |v: u8| clamp_channel(v as f32 * (1.0 - intensity) + avg * intensity);
        buffer.set_rgb(index as usize, mix(color.r), mix(color.g), mix(color.b));
    }
}
