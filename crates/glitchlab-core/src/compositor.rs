//! Replays every layer's filter over a fresh copy of the original image.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::filters::FilterContext;
use crate::layer::{HistoryMode, Layer, Selection};
use crate::mask::full_indices;
use crate::pixel::PixelBuffer;

/// Which layers should throw away their cached intermediates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Refresh {
    /// Reuse every cache.
    #[default]
    None,
    /// Regenerate the given layer and every layer after it, since their input
    /// changes with it.
    Layer(usize),
    /// Regenerate every layer (animation frames).
    All,
}

impl Refresh {
    pub fn applies_to(&self, index: usize) -> bool {
        match *self {
            Refresh::None => false,
            Refresh::Layer(from) => index >= from,
            Refresh::All => true,
        }
    }
}

/// Outcome of one composite pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompositeStats {
    pub layers_applied: usize,
    pub caches_regenerated: usize,
}

/// Reset `working` from `original`, then apply each layer in order.
///
/// A layer whose mask is empty acts on the whole image. Regenerated caches
/// are written back into the layer's present history entry without adding an
/// undo step.
pub fn composite(
    original: &PixelBuffer,
    working: &mut PixelBuffer,
    layers: &mut [Layer],
    refresh: Refresh,
    rng: &mut dyn RngCore,
) -> CompositeStats {
    working.copy_from(original);
    let full = full_indices(working.width(), working.height());
    let mut stats = CompositeStats::default();

    for (index, layer) in layers.iter_mut().enumerate() {
        let selection = layer.selection();
        let mask: &[u32] = if selection.mask.is_empty() {
            &full
        } else {
            &selection.mask
        };
        let refresh_layer = refresh.applies_to(index);
        log::debug!(
            "Applying layer {} ({}) to {} pixels, refresh={}",
            index,
            selection.filter.name(),
            mask.len(),
            refresh_layer
        );

        let updated = selection.filter.apply(&mut FilterContext {
            buffer: working,
            mask,
            refresh: refresh_layer,
            rng: &mut *rng,
        });
        stats.layers_applied += 1;

        if let Some(filter) = updated {
            let next = Selection {
                filter,
                ..layer.selection().clone()
            };
            layer.update(next, HistoryMode::ReplacePresent);
            stats.caches_regenerated += 1;
        }
    }

    log::debug!(
        "Composited {} layers, {} caches regenerated",
        stats.layers_applied,
        stats.caches_regenerated
    );
    stats
}
