//! Pixel filters and the registry that ties a filter id to its config and
//! implementation.
//!
//! A filter reads and writes only the pixels listed in its mask. Filters that
//! build a whole-image intermediate (pixel sorts, datamosh, sound texture)
//! keep it in a [`PixelCache`] on their config and copy back just the masked
//! pixels. Randomness comes exclusively from the RNG in [`FilterContext`].

pub mod as_sound;
pub mod brightness;
pub mod duotone;
pub mod fractal_sort;
pub mod grayscale;
pub mod offset_sort;
pub mod pixel_sort;
pub mod rgb_shift;
pub mod slice;

use std::fmt;
use std::sync::Arc;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::pixel::PixelBuffer;

pub use as_sound::AsSoundConfig;
pub use brightness::BrightnessConfig;
pub use duotone::DuotoneConfig;
pub use fractal_sort::FractalPixelSortConfig;
pub use grayscale::GrayscaleConfig;
pub use offset_sort::OffsetPixelSortConfig;
pub use pixel_sort::{PixelSortConfig, SortDirection};
pub use rgb_shift::{RgbShiftConfig, RgbShiftEffect};
pub use slice::SliceConfig;

/// Everything a filter may touch during one invocation.
pub struct FilterContext<'a> {
    /// The shared working buffer.
    pub buffer: &'a mut PixelBuffer,
    /// Flattened indices of the pixels this layer may write.
    pub mask: &'a [u32],
    /// Discard cached intermediates and generate new ones.
    pub refresh: bool,
    pub rng: &'a mut dyn RngCore,
}

/// A whole-image RGBA intermediate kept between composites.
///
/// Shared behind an `Arc` so history snapshots do not copy pixel data. Never
/// serialized; a deserialized layer regenerates it on first use.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PixelCache(Option<Arc<[u8]>>);

impl PixelCache {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Some(bytes.into()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.as_ref().map_or(true, |b| b.is_empty())
    }

    pub fn bytes(&self) -> &[u8] {
        self.0.as_deref().unwrap_or(&[])
    }

    /// Whether the cache was built for a buffer of `len` bytes.
    pub fn fits(&self, len: usize) -> bool {
        self.bytes().len() == len
    }
}

impl fmt::Debug for PixelCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PixelCache({} bytes)", self.bytes().len())
    }
}

/// Numeric slider metadata for one filter parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
    pub default: f32,
    pub step: Option<f32>,
}

impl ParamRange {
    pub const fn new(min: f32, max: f32, default: f32) -> Self {
        Self {
            min,
            max,
            default,
            step: None,
        }
    }

    pub const fn with_step(self, step: f32) -> Self {
        Self {
            step: Some(step),
            ..self
        }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Filter identifier without parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    None,
    Grayscale,
    Brightness,
    RgbShift,
    Slice,
    PixelSort,
    FractalPixelSort,
    OffsetPixelSort,
    AsSound,
    Duotone,
}

impl FilterKind {
    pub const ALL: [FilterKind; 10] = [
        FilterKind::None,
        FilterKind::Grayscale,
        FilterKind::Brightness,
        FilterKind::RgbShift,
        FilterKind::Slice,
        FilterKind::PixelSort,
        FilterKind::FractalPixelSort,
        FilterKind::OffsetPixelSort,
        FilterKind::AsSound,
        FilterKind::Duotone,
    ];

    /// Display name for the layer list.
    pub fn name(&self) -> &'static str {
        match self {
            FilterKind::None => "No Filter",
            FilterKind::Grayscale => "Grayscale",
            FilterKind::Brightness => "Brightness",
            FilterKind::RgbShift => "RGB Shift",
            FilterKind::Slice => "Slice",
            FilterKind::PixelSort => "Pixel Sort",
            FilterKind::FractalPixelSort => "Fractal Pixel Sort",
            FilterKind::OffsetPixelSort => "Offset Pixel Sort",
            FilterKind::AsSound => "Data-as-Sound",
            FilterKind::Duotone => "Duotone",
        }
    }

    /// A fresh config with every parameter at its default and no cache.
    pub fn default_config(&self) -> Filter {
        match self {
            FilterKind::None => Filter::None,
            FilterKind::Grayscale => Filter::Grayscale(GrayscaleConfig::default()),
            FilterKind::Brightness => Filter::Brightness(BrightnessConfig::default()),
            FilterKind::RgbShift => Filter::RgbShift(RgbShiftConfig::default()),
            FilterKind::Slice => Filter::Slice(SliceConfig::default()),
            FilterKind::PixelSort => Filter::PixelSort(PixelSortConfig::default()),
            FilterKind::FractalPixelSort => {
                Filter::FractalPixelSort(FractalPixelSortConfig::default())
            }
            FilterKind::OffsetPixelSort => Filter::OffsetPixelSort(OffsetPixelSortConfig::default()),
            FilterKind::AsSound => Filter::AsSound(AsSoundConfig::default()),
            FilterKind::Duotone => Filter::Duotone(DuotoneConfig::default()),
        }
    }

    /// Slider ranges for the numeric parameters, by parameter name.
    pub fn params(&self) -> Vec<(&'static str, ParamRange)> {
        match self {
            FilterKind::None => Vec::new(),
            FilterKind::Grayscale => vec![("intensity", grayscale::INTENSITY)],
            FilterKind::Brightness => vec![("intensity", brightness::INTENSITY)],
            FilterKind::RgbShift => vec![("intensity", rgb_shift::INTENSITY)],
            FilterKind::Slice => vec![("intensity", slice::INTENSITY)],
            FilterKind::PixelSort => vec![("intensity", pixel_sort::INTENSITY)],
            FilterKind::FractalPixelSort => vec![("intensity", fractal_sort::INTENSITY)],
            FilterKind::OffsetPixelSort => vec![("intensity", offset_sort::INTENSITY)],
            FilterKind::AsSound => vec![("blend", as_sound::BLEND)],
            FilterKind::Duotone => vec![
                ("brightness", duotone::BRIGHTNESS),
                ("contrast", duotone::CONTRAST),
            ],
        }
    }

    /// Whether this filter keeps a whole-image intermediate between runs.
    pub fn is_cached(&self) -> bool {
        matches!(
            self,
            FilterKind::PixelSort
                | FilterKind::FractalPixelSort
                | FilterKind::OffsetPixelSort
                | FilterKind::AsSound
        )
    }
}

impl Default for FilterKind {
    fn default() -> Self {
        FilterKind::None
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A filter together with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "filter", content = "config")]
pub enum Filter {
    None,
    Grayscale(GrayscaleConfig),
    Brightness(BrightnessConfig),
    RgbShift(RgbShiftConfig),
    Slice(SliceConfig),
    PixelSort(PixelSortConfig),
    FractalPixelSort(FractalPixelSortConfig),
    OffsetPixelSort(OffsetPixelSortConfig),
    AsSound(AsSoundConfig),
    Duotone(DuotoneConfig),
}

impl Default for Filter {
    fn default() -> Self {
        Filter::None
    }
}

impl Filter {
    pub fn kind(&self) -> FilterKind {
        match self {
            Filter::None => FilterKind::None,
            Filter::Grayscale(_) => FilterKind::Grayscale,
            Filter::Brightness(_) => FilterKind::Brightness,
            Filter::RgbShift(_) => FilterKind::RgbShift,
            Filter::Slice(_) => FilterKind::Slice,
            Filter::PixelSort(_) => FilterKind::PixelSort,
            Filter::FractalPixelSort(_) => FilterKind::FractalPixelSort,
            Filter::OffsetPixelSort(_) => FilterKind::OffsetPixelSort,
            Filter::AsSound(_) => FilterKind::AsSound,
            Filter::Duotone(_) => FilterKind::Duotone,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Run the filter over `ctx.buffer`.
    ///
    /// Returns the updated config when the filter regenerated its cache.
    pub fn apply(&self, ctx: &mut FilterContext<'_>) -> Option<Filter> {
        match self {
            Filter::None => None,
            Filter::Grayscale(config) => {
                grayscale::apply(ctx, config);
                None
            }
            Filter::Brightness(config) => {
                brightness::apply(ctx, config);
                None
            }
            Filter::RgbShift(config) => {
                rgb_shift::apply(ctx, config);
                None
            }
            Filter::Slice(config) => {
                slice::apply(ctx, config);
                None
            }
            Filter::Duotone(config) => {
                duotone::apply(ctx, config);
                None
            }
            Filter::PixelSort(config) => pixel_sort::apply(ctx, config).map(|cache| {
                Filter::PixelSort(PixelSortConfig {
                    cache,
                    ..config.clone()
                })
            }),
            Filter::FractalPixelSort(config) => fractal_sort::apply(ctx, config).map(|cache| {
                Filter::FractalPixelSort(FractalPixelSortConfig {
                    cache,
                    ..config.clone()
                })
            }),
            Filter::OffsetPixelSort(config) => offset_sort::apply(ctx, config).map(|cache| {
                Filter::OffsetPixelSort(OffsetPixelSortConfig {
                    cache,
                    ..config.clone()
                })
            }),
            Filter::AsSound(config) => as_sound::apply(ctx, config).map(|cache| {
                Filter::AsSound(AsSoundConfig {
                    cache,
                    ..config.clone()
                })
            }),
        }
    }

    pub fn cache(&self) -> Option<&PixelCache> {
        match self {
            Filter::PixelSort(c) => Some(&c.cache),
            Filter::FractalPixelSort(c) => Some(&c.cache),
            Filter::OffsetPixelSort(c) => Some(&c.cache),
            Filter::AsSound(c) => Some(&c.cache),
            _ => None,
        }
    }

    fn cache_mut(&mut self) -> Option<&mut PixelCache> {
        match self {
            Filter::PixelSort(c) => Some(&mut c.cache),
            Filter::FractalPixelSort(c) => Some(&mut c.cache),
            Filter::OffsetPixelSort(c) => Some(&mut c.cache),
            Filter::AsSound(c) => Some(&mut c.cache),
            _ => None,
        }
    }

    /// Drop any cached intermediate so the next run regenerates it.
    pub fn clear_cache(&mut self) {
        if let Some(cache) = self.cache_mut() {
            *cache = PixelCache::default();
        }
    }

    /// Carry the cache of `previous` over into this config when both are the
    /// same filter. Used when only parameters change.
    pub fn with_cache_from(mut self, previous: &Filter) -> Self {
        if self.kind() == previous.kind() {
            if let (Some(cache), Some(old)) = (self.cache_mut(), previous.cache()) {
                *cache = old.clone();
            }
        }
        self
    }
}
