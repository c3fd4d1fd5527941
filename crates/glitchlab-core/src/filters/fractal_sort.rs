use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::{FilterContext, ParamRange, PixelCache};
use crate::pixel::CHANNELS;

pub const INTENSITY: ParamRange = ParamRange::new(2.0, 12.0, 6.0).with_step(1.0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FractalPixelSortConfig {
    /// Stride multiplier of the sort pass.
    pub intensity: u32,
    #[serde(skip)]
    pub cache: PixelCache,
}

impl Default for FractalPixelSortConfig {
    fn default() -> Self {
        Self {
            intensity: INTENSITY.default as u32,
            cache: PixelCache::default(),
        }
    }
}

/// Returns the new cache when the distortion was regenerated.
pub fn apply(ctx: &mut FilterContext<'_>, config: &FractalPixelSortConfig) -> Option<PixelCache> {
    let len = ctx.buffer.data().len();
    let regenerate = ctx.refresh || config.cache.is_empty() || !config.cache.fits(len);
    let cache = if regenerate {
        let mut data = ctx.buffer.data().to_vec();
        stride_sort(&mut data, config.intensity as usize);
        channel_shift(&mut data, ctx.buffer.width() as usize, ctx.buffer.height() as usize, ctx.rng);
        PixelCache::new(data)
    } else {
        config.cache.clone()
    };

    ctx.buffer.copy_rgb_from(cache.bytes(), ctx.mask);
    regenerate.then_some(cache)
}

/// Walking from the end, replace each byte with the byte at
/// `(i * stride) % len` whenever that one is smaller.
pub fn stride_sort(data: &mut [u8], stride: usize) {
    let len = data.len();
    for i in (1..len).rev() {
        let j = (i * stride) % len;
        if data[j] < data[i] {
            data[i] = data[j];
        }
    }
}

/// Scatter channels sideways by a session-random byte offset, with a coin
/// flip per pixel for the direction.
fn channel_shift(data: &mut [u8], width: usize, height: usize, rng: &mut dyn RngCore) {
    let span = width as f64 - 10.0;
    let left = (rng.random::<f64>() * span + 10.0).round() as i64;
    let right = (rng.random::<f64>() * span + left as f64).round() as i64;
    let variant = right.rem_euclid(3);
    let len = data.len() as i64;

    for y in 0..height {
        for x in 0..width {
            let index = ((y * width + x) * CHANNELS) as i64;
            let i = index as usize;
            let (r, g, b) = (data[i], data[i + 1], data[i + 2]);
            let forward = rng.random::<bool>();

            if forward {
                if index + left + 1 > len - 1 {
                    continue;
                }
                let ahead = (index + left) as usize;
                match variant {
                    0 => {
                        data[i] = b;
                        data[ahead] = r;
                        data[ahead + 1] = g;
                    }
                    1 => {
                        data[i] = r;
                        data[ahead] = b;
                        data[ahead + 1] = g;
                    }
                    _ => {
                        data[i] = r;
                        data[ahead] = b;
                    }
                }
            } else {
                if index - left < 0 {
                    continue;
                }
                let behind = (index - left) as usize;
                match variant {
                    0 => {
                        data[i] = b;
                        data[behind] = g;
                        data[behind + 1] = r;
                    }
                    1 => {
                        data[i + 1] = b;
                        data[behind] = b;
                    }
                    _ => {
                        data[i] = g;
                        data[behind] = b;
                        data[behind + 1] = r;
                    }
                }
            }
        }
    }
}
