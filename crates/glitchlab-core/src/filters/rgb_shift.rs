use serde::{Deserialize, Serialize};

use super::{FilterContext, ParamRange};
use crate::pixel::clamp_channel;

pub const INTENSITY: ParamRange = ParamRange::new(1.0, 100.0, 5.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RgbShiftEffect {
    /// Pull the weaker channels of saturated pixels towards the strongest one.
    Vibrance,
    Red,
    Green,
    Blue,
}

impl RgbShiftEffect {
    pub const ALL: [RgbShiftEffect; 4] = [
        RgbShiftEffect::Vibrance,
        RgbShiftEffect::Red,
        RgbShiftEffect::Green,
        RgbShiftEffect::Blue,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RgbShiftConfig {
    pub effect: RgbShiftEffect,
    pub intensity: f32,
}

impl Default for RgbShiftConfig {
    fn default() -> Self {
        Self {
            effect: RgbShiftEffect::Vibrance,
            intensity: INTENSITY.default,
        }
    }
}

pub fn apply(ctx: &mut FilterContext<'_>, config: &RgbShiftConfig) {
    let intensity = config.intensity;
    for &index in ctx.mask {
        let c = ctx.buffer.pixel(index as usize);
        let (r, g, b) = (c.r as f32, c.g as f32, c.b as f32);
        let (r, g, b) = match config.effect {
            RgbShiftEffect::Vibrance => {
                let max = r.max(g).max(b);
                let avg = (r + g + b) / 3.0;
                let amt = ((max - avg).abs() * 2.0 / 255.0) * (-intensity / 100.0);
                let pull = |v: f32| if v == max { v } else { v + (max - v) * amt };
                (pull(r), pull(g), pull(b))
            }
            RgbShiftEffect::Red => (r + intensity, g - intensity, b - intensity),
            RgbShiftEffect::Green => (r - intensity, g + intensity, b - intensity),
            RgbShiftEffect::Blue => (r - intensity, g - intensity, b + intensity),
        };
        ctx.buffer
            .set_rgb(index as usize, clamp_channel(r), clamp_channel(g), clamp_channel(b));
    }
}
