use serde::{Deserialize, Serialize};

use super::{FilterContext, ParamRange, PixelCache};
use crate::pixel::{Color, CHANNELS};

pub const INTENSITY: ParamRange = ParamRange::new(1.0, 100.0, 1.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    /// Sort runs within each column.
    Vertical,
    /// Sort runs within each row.
    Horizontal,
}

impl SortDirection {
    pub const ALL: [SortDirection; 2] = [SortDirection::Vertical, SortDirection::Horizontal];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixelSortConfig {
    pub direction: SortDirection,
    /// Brightness threshold in percent; darker pixels get sorted.
    pub intensity: f32,
    #[serde(skip)]
    pub cache: PixelCache,
}

impl Default for PixelSortConfig {
    fn default() -> Self {
        Self {
            direction: SortDirection::Vertical,
            intensity: INTENSITY.default,
            cache: PixelCache::default(),
        }
    }
}

/// Returns the new cache when the sorted image was regenerated.
pub fn apply(ctx: &mut FilterContext<'_>, config: &PixelSortConfig) -> Option<PixelCache> {
    let len = ctx.buffer.data().len();
    let regenerate = ctx.refresh || config.cache.is_empty() || !config.cache.fits(len);
    let cache = if regenerate {
        let mut sorted = ctx.buffer.data().to_vec();
        sort_runs(
            &mut sorted,
            ctx.buffer.width() as usize,
            ctx.buffer.height() as usize,
            config.direction,
            config.intensity / 100.0,
        );
        PixelCache::new(sorted)
    } else {
        config.cache.clone()
    };

    ctx.buffer.copy_rgb_from(cache.bytes(), ctx.mask);
    regenerate.then_some(cache)
}

/// Sort every run of pixels no brighter than `threshold` by brightness,
/// ascending and stable, in place along each line.
pub fn sort_runs(data: &mut [u8], width: usize, height: usize, direction: SortDirection, threshold: f32) {
    let (lines, span) = match direction {
        SortDirection::Vertical => (width, height),
        SortDirection::Horizontal => (height, width),
    };
    let offset = |line: usize, pos: usize| -> usize {
        let index = match direction {
            SortDirection::Vertical => pos * width + line,
            SortDirection::Horizontal => line * width + pos,
        };
        index * CHANNELS
    };

    let mut run: Vec<Color> = Vec::new();
    for line in 0..lines {
        let mut run_start = 0;
        for pos in 0..span {
            let i = offset(line, pos);
            let color = Color::new(data[i], data[i + 1], data[i + 2], data[i + 3]);
            if color.brightness() > threshold {
                flush_run(data, &mut run, |k| offset(line, run_start + k));
            } else {
                if run.is_empty() {
                    run_start = pos;
                }
                run.push(color);
            }
        }
        flush_run(data, &mut run, |k| offset(line, run_start + k));
    }
}

fn flush_run(data: &mut [u8], run: &mut Vec<Color>, offset: impl Fn(usize) -> usize) {
    if run.is_empty() {
        return;
    }
    run.sort_by(|a, b| a.brightness().total_cmp(&b.brightness()));
    for (k, color) in run.drain(..).enumerate() {
        let i = offset(k);
        data[i] = color.r;
        data[i + 1] = color.g;
        data[i + 2] = color.b;
    }
}
