use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::{FilterContext, ParamRange, PixelCache};
use crate::pixel::CHANNELS;

pub const INTENSITY: ParamRange = ParamRange::new(1.0, 20.0, 1.0).with_step(1.0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetPixelSortConfig {
    /// Number of band pairs and the scale of their offsets.
    pub intensity: u32,
    #[serde(skip)]
    pub cache: PixelCache,
}

impl Default for OffsetPixelSortConfig {
    fn default() -> Self {
        Self {
            intensity: INTENSITY.default as u32,
            cache: PixelCache::default(),
        }
    }
}

/// Returns the new cache when the datamosh was regenerated.
pub fn apply(ctx: &mut FilterContext<'_>, config: &OffsetPixelSortConfig) -> Option<PixelCache> {
    let len = ctx.buffer.data().len();
    let regenerate = ctx.refresh || config.cache.is_empty() || !config.cache.fits(len);
    let cache = if regenerate {
        PixelCache::new(datamosh(
            ctx.buffer.data(),
            ctx.buffer.width() as usize,
            ctx.buffer.height() as usize,
            config.intensity as i64,
            ctx.rng,
        ))
    } else {
        config.cache.clone()
    };

    ctx.buffer.copy_rgba_from(cache.bytes(), ctx.mask);
    regenerate.then_some(cache)
}

/// Shift random horizontal bands with wraparound, then recombine every pixel
/// with a diagonally offset one, keeping a single channel from the clean image.
fn datamosh(source: &[u8], width: usize, height: usize, distortion: i64, rng: &mut dyn RngCore) -> Vec<u8> {
    let mut moshed = source.to_vec();
    let w = width as i64;
    let h = height as i64;
    let max_offset = ((distortion * distortion) as f64 / 100.0 * width as f64) as i64;

    for _ in 0..distortion * 2 {
        let band_y = rng.random_range(0..=h);
        let band_height = rng.random_range(1..=(h / 4).max(1)).min(h - band_y);
        let offset = rng.random_range(-max_offset..=max_offset);
        if offset == 0 {
            continue;
        }
        for y in band_y..band_y + band_height {
            let row = (y * w) as usize;
            for x in 0..w {
                let dst_x = (x + offset).rem_euclid(w) as usize;
                let src = (row + x as usize) * CHANNELS;
                let dst = (row + dst_x) * CHANNELS;
                moshed[dst..dst + CHANNELS].copy_from_slice(&source[src..src + CHANNELS]);
            }
        }
    }

    let clean_channel = rng.random_range(0..=2usize);
    let start_x = rng.random_range(-distortion * 2..=distortion * 2);
    let start_y = rng.random_range(-distortion * 2..=distortion * 2);

    for y in 0..h {
        for x in 0..w {
            let sx = start_x + x;
            let sy = start_y + y;
            if sx < 0 || sx >= w || sy < 0 || sy >= h {
                continue;
            }
            let target = ((sy * w + sx) as usize) * CHANNELS;
            let clean = ((y * w + x) as usize) * CHANNELS;
            moshed[target + clean_channel] = source[clean + clean_channel];
        }
    }

    moshed
}
