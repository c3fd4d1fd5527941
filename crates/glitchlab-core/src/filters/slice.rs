use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{FilterContext, ParamRange};
use crate::pixel::CHANNELS;

pub const INTENSITY: ParamRange = ParamRange::new(-100.0, 0.0, -100.0);

/// Chance per column of picking a new shift, and separately of resetting it.
const SHIFT_CHANCE: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliceConfig {
    pub intensity: f32,
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            intensity: INTENSITY.default,
        }
    }
}

/// Vertical tearing. Not cached: every run draws a fresh set of tears.
pub fn apply(ctx: &mut FilterContext<'_>, config: &SliceConfig) {
    let width = ctx.buffer.width() as usize;
    let height = ctx.buffer.height() as usize;
    let distortion = config.intensity / 10.0;
    let mut sliced = ctx.buffer.data().to_vec();

    let mut shift: i64 = -1;
    for x in 0..width {
        if ctx.rng.random::<f32>() < SHIFT_CHANCE {
            let fraction = (1.0 - distortion) * ctx.rng.random::<f32>() + distortion;
            shift = (fraction * height as f32).floor() as i64;
        }
        if ctx.rng.random::<f32>() < SHIFT_CHANCE {
            shift = 0;
        }
        // Rows are moved in place, so a shifted row can be picked up again
        // further down the column. That smear is part of the look.
        for y in 0..height {
            let src = (y * width + x) * CHANNELS;
            let row = (y as i64 + shift).rem_euclid(height as i64) as usize;
            let dst = (row * width + x) * CHANNELS;
            sliced.copy_within(src..src + CHANNELS, dst);
        }
    }

    ctx.buffer.copy_rgb_from(&sliced, ctx.mask);
}
