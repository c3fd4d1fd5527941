use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::compositor::{self, CompositeStats, Refresh};
use crate::error::EditError;
use crate::filters::{Filter, FilterKind};
use crate::geometry::{translate_points, Point};
use crate::layer::{Direction, HistoryMode, Layer, Selection};
use crate::mask::rasterize_indices;
use crate::pixel::PixelBuffer;
use crate::spatial::{SelectionEntry, SelectionIndex};

fn entropy_rng() -> Pcg32 {
    Pcg32::from_rng(&mut rand::rng())
}

/// The editing session: one source image, the working result and the
/// ordered layers composited over it.
///
/// Layer indices that are out of range are ignored: the operation logs and
/// returns `false` instead of failing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    /// The loaded image. Never modified after load.
    #[serde(skip)]
    original: Option<PixelBuffer>,
    /// The displayed result, rebuilt from `original` on every composite.
    #[serde(skip)]
    working: Option<PixelBuffer>,
    layers: Vec<Layer>,
    selected: Option<usize>,
    #[serde(skip, default = "entropy_rng")]
    rng: Pcg32,
    #[serde(skip)]
    busy: u32,
}

impl Document {
    pub fn new(name: &str) -> Self {
        Self::with_rng(name, entropy_rng())
    }

    /// A document whose random filters and color tags are reproducible.
    pub fn with_seed(name: &str, seed: u64) -> Self {
        Self::with_rng(name, Pcg32::seed_from_u64(seed))
    }

    fn with_rng(name: &str, rng: Pcg32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            original: None,
            working: None,
            layers: Vec::new(),
            selected: None,
            rng,
            busy: 0,
        }
    }

    // ── Image ────────────────────────────────────────────────────────

    /// Store a decoded RGBA image as the original and working buffers.
    ///
    /// Existing layers are kept. Every history entry of every layer gets its
    /// mask rasterized again for the new dimensions and its cache dropped, so
    /// undo and redo never bring back state built for another image.
    pub fn load_image(&mut self, width: u32, height: u32, rgba: Vec<u8>) -> Result<(), EditError> {
        let buffer = PixelBuffer::from_rgba(width, height, rgba)?;
        log::info!("Loaded {}x{} image into '{}'", width, height, self.name);
        self.working = Some(buffer.clone());
        self.original = Some(buffer);
        for layer in &mut self.layers {
            layer.rewrite_history(|mut selection| {
                selection.mask = rasterize_indices(&selection.points, width, height);
                selection.filter.clear_cache();
                selection
            });
        }
        Ok(())
    }

    pub fn has_image(&self) -> bool {
        self.original.is_some()
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.original.as_ref().map(|b| (b.width(), b.height()))
    }

    pub fn original_buffer(&self) -> Option<&PixelBuffer> {
        self.original.as_ref()
    }

    /// The current result, for painting or export.
    pub fn working_buffer(&self) -> Option<&PixelBuffer> {
        self.working.as_ref()
    }

    /// Copy the original image back into the working buffer without running
    /// any filter.
    pub fn reset_working_buffer(&mut self) -> bool {
        match (&self.original, &mut self.working) {
            (Some(original), Some(working)) => {
                working.copy_from(original);
                true
            }
            _ => {
                log::debug!("reset_working_buffer: no image loaded");
                false
            }
        }
    }

    // ── Layer management ─────────────────────────────────────────────

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_layer(&self) -> Option<&Layer> {
        self.selected.and_then(|i| self.layers.get(i))
    }

    /// Append an empty layer and select it. Returns its index.
    pub fn add_layer(&mut self) -> usize {
        let layer = Layer::with_random_color(&mut self.rng);
        log::info!("Added layer {} ({})", self.layers.len(), layer.id);
        self.layers.push(layer);
        let index = self.layers.len() - 1;
        self.selected = Some(index);
        index
    }

    pub fn select_layer(&mut self, index: usize) -> bool {
        if !self.in_bounds(index) {
            return false;
        }
        self.selected = Some(index);
        true
    }

    /// Remove a layer and its history. The selection moves to the layer now
    /// at `index`, or the last one, or none when the list is empty.
    pub fn delete_layer(&mut self, index: usize) -> bool {
        if !self.in_bounds(index) {
            return false;
        }
        let removed = self.layers.remove(index);
        log::info!("Deleted layer {} ({})", index, removed.id);
        self.selected = if self.layers.is_empty() {
            None
        } else {
            Some(index.min(self.layers.len() - 1))
        };
        true
    }

    /// Swap a layer with its neighbor. Does nothing at either end.
    pub fn move_layer(&mut self, index: usize, direction: Direction) -> bool {
        if !self.in_bounds(index) {
            return false;
        }
        let target = match direction {
            Direction::Up if index > 0 => index - 1,
            Direction::Down if index + 1 < self.layers.len() => index + 1,
            _ => {
                log::debug!("move_layer: layer {} already at the boundary", index);
                return false;
            }
        };
        self.layers.swap(index, target);
        if self.selected == Some(index) {
            self.selected = Some(target);
        } else if self.selected == Some(target) {
            self.selected = Some(index);
        }
        log::info!("Moved layer {} to {}", index, target);
        true
    }

    /// Insert a copy of a layer right after it. The same layer stays selected.
    pub fn duplicate_layer(&mut self, index: usize) -> Option<usize> {
        if !self.in_bounds(index) {
            return None;
        }
        let copy = self.layers[index].duplicate(&mut self.rng);
        let at = index + 1;
        log::info!("Duplicated layer {} as {} ({})", index, at, copy.id);
        self.layers.insert(at, copy);
        if let Some(selected) = self.selected {
            if selected > index {
                self.selected = Some(selected + 1);
            }
        }
        Some(at)
    }

    /// Drop every layer and the loaded image.
    pub fn clear_layers(&mut self) {
        log::info!("Cleared {} layers from '{}'", self.layers.len(), self.name);
        self.layers.clear();
        self.selected = None;
        self.original = None;
        self.working = None;
    }

    // ── Selection edits ──────────────────────────────────────────────

    /// Replace the layer's path, rasterize its mask and record an undo step.
    pub fn set_points(&mut self, index: usize, points: Vec<Point>, start: Point) -> bool {
        self.set_points_with(index, points, start, HistoryMode::Push)
    }

    pub fn set_points_with(
        &mut self,
        index: usize,
        points: Vec<Point>,
        start: Point,
        mode: HistoryMode,
    ) -> bool {
        if !self.in_bounds(index) {
            return false;
        }
        let mask = self.rasterize(&points);
        let layer = &mut self.layers[index];
        let mut selection = Selection {
            points,
            start,
            mask,
            ..layer.selection().clone()
        };
        selection.filter.clear_cache();
        layer.update(selection, mode);
        true
    }

    /// Translate the layer's path by `(dx, dy)` and rasterize it again.
    pub fn move_selection(&mut self, index: usize, dx: i32, dy: i32) -> bool {
        let Some(layer) = self.layers.get(index) else {
            log::debug!("move_selection: no layer {}", index);
            return false;
        };
        let current = layer.selection();
        let points = translate_points(&current.points, dx, dy);
        let start = current.start.translate(dx, dy);
        self.set_points(index, points, start)
    }

    /// Switch the layer to `kind` with its default config.
    pub fn set_filter(&mut self, index: usize, kind: FilterKind, mode: HistoryMode) -> bool {
        if !self.in_bounds(index) {
            return false;
        }
        let layer = &mut self.layers[index];
        let selection = Selection {
            filter: kind.default_config(),
            ..layer.selection().clone()
        };
        log::debug!("Layer {} filter set to {}", index, kind);
        layer.update(selection, mode);
        true
    }

    /// Replace the parameters of the layer's current filter and record an
    /// undo step. Points and mask are left alone and the cache is carried
    /// over; request a refresh of this layer to rebuild it.
    pub fn set_filter_config(&mut self, index: usize, filter: Filter) -> Result<bool, EditError> {
        self.update_filter_config(index, |current| *current = filter)
    }

    /// Edit the layer's current filter config in place, so fields `edit`
    /// leaves alone keep their values. Records one undo step. Switching the
    /// filter kind here is rejected with [`EditError::FilterMismatch`].
    pub fn update_filter_config(
        &mut self,
        index: usize,
        edit: impl FnOnce(&mut Filter),
    ) -> Result<bool, EditError> {
        if !self.in_bounds(index) {
            return Ok(false);
        }
        let layer = &mut self.layers[index];
        let current = layer.selection();
        let mut filter = current.filter.clone();
        edit(&mut filter);
        if current.filter.kind() != filter.kind() {
            return Err(EditError::FilterMismatch {
                expected: current.filter.kind(),
                actual: filter.kind(),
            });
        }
        let selection = Selection {
            filter: filter.with_cache_from(&current.filter),
            ..current.clone()
        };
        layer.update(selection, HistoryMode::Push);
        Ok(true)
    }

    pub fn undo(&mut self, index: usize) -> bool {
        match self.layers.get_mut(index) {
            Some(layer) => {
                let done = layer.undo();
                if !done {
                    log::debug!("Nothing to undo on layer {}", index);
                }
                done
            }
            None => false,
        }
    }

    pub fn redo(&mut self, index: usize) -> bool {
        match self.layers.get_mut(index) {
            Some(layer) => {
                let done = layer.redo();
                if !done {
                    log::debug!("Nothing to redo on layer {}", index);
                }
                done
            }
            None => false,
        }
    }

    // ── Compositing ──────────────────────────────────────────────────

    /// Rebuild the working buffer from the original and every layer.
    ///
    /// Returns `false` without doing anything when no image is loaded.
    pub fn generate_result(&mut self, refresh: Refresh) -> bool {
        self.composite(refresh).is_some()
    }

    fn composite(&mut self, refresh: Refresh) -> Option<CompositeStats> {
        let (Some(original), Some(working)) = (&self.original, &mut self.working) else {
            log::debug!("generate_result: no image loaded");
            return None;
        };
        self.busy += 1;
        let stats = compositor::composite(original, working, &mut self.layers, refresh, &mut self.rng);
        self.busy -= 1;
        log::info!(
            "Generated result for '{}': {} layers, {} caches regenerated",
            self.name,
            stats.layers_applied,
            stats.caches_regenerated
        );
        Some(stats)
    }

    /// Render `count` frames for an animation. The first frame uses the
    /// current caches, every following one regenerates all of them.
    pub fn generate_frames(&mut self, count: usize) -> Vec<PixelBuffer> {
        let mut frames = Vec::with_capacity(count);
        for frame in 0..count {
            let refresh = if frame == 0 { Refresh::None } else { Refresh::All };
            if !self.generate_result(refresh) {
                break;
            }
            if let Some(working) = &self.working {
                frames.push(working.clone());
            }
        }
        frames
    }

    // ── Busy markers ─────────────────────────────────────────────────

    pub fn begin_busy(&mut self) {
        self.busy += 1;
    }

    pub fn end_busy(&mut self) {
        self.busy = self.busy.saturating_sub(1);
    }

    pub fn is_busy(&self) -> bool {
        self.busy > 0
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Indices of layers whose selection box contains `point`, topmost first.
    pub fn layers_at(&self, point: &Point) -> Vec<usize> {
        let entries = self
            .layers
            .iter()
            .enumerate()
            .filter_map(|(layer_index, layer)| {
                layer
                    .selection()
                    .bbox()
                    .map(|bbox| SelectionEntry { layer_index, bbox })
            })
            .collect();
        SelectionIndex::build(entries).query_point(point)
    }

    fn in_bounds(&self, index: usize) -> bool {
        let ok = index < self.layers.len();
        if !ok {
            log::debug!("Layer index {} out of bounds ({} layers)", index, self.layers.len());
        }
        ok
    }

    fn rasterize(&self, points: &[Point]) -> Vec<u32> {
        match self.dimensions() {
            Some((width, height)) => rasterize_indices(points, width, height),
            None => Vec::new(),
        }
    }

    // ── Serialization ────────────────────────────────────────────────

    /// Layers, paths, filter settings and history. Pixel data is not included.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{BrightnessConfig, DuotoneConfig, GrayscaleConfig, SliceConfig};
    use crate::filters::test_support::gradient;
    use crate::pixel::clamp_channel;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn rect(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<Point> {
        vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ]
    }

    fn doc_with_image(width: u32, height: u32) -> Document {
        let mut doc = Document::with_seed("test", 42);
        doc.load_image(width, height, gradient(width, height).into_data()).unwrap();
        doc
    }

    #[test]
    fn test_document_create() {
        let doc = Document::new("project");
        assert_eq!(doc.name, "project");
        assert_eq!(doc.layer_count(), 0);
        assert_eq!(doc.selected_index(), None);
        assert!(!doc.has_image());
    }

    #[test]
    fn test_load_image_validates_size() {
        let mut doc = Document::new("test");
        assert_eq!(
            doc.load_image(2, 2, vec![0; 12]),
            Err(EditError::BufferSizeMismatch {
                expected: 16,
                actual: 12
            })
        );
        assert!(!doc.has_image());
        assert!(doc.load_image(2, 2, vec![0; 16]).is_ok());
        assert_eq!(doc.dimensions(), Some((2, 2)));
        assert_eq!(doc.working_buffer(), doc.original_buffer());
    }

    #[test]
    fn test_full_image_grayscale() {
        init_logger();
        let mut doc = doc_with_image(4, 4);
        let idx = doc.add_layer();
        assert!(doc.set_points(idx, rect(0, 0, 3, 3), Point::new(0, 0)));
        assert_eq!(doc.layer(idx).unwrap().selection().mask.len(), 16);
        assert!(doc.set_filter(idx, FilterKind::Grayscale, HistoryMode::Push));
        doc.set_filter_config(idx, Filter::Grayscale(GrayscaleConfig { intensity: 1.0 }))
            .unwrap();
        assert!(doc.generate_result(Refresh::None));

        let original = doc.original_buffer().unwrap().clone();
        let result = doc.working_buffer().unwrap();
        for i in 0..16 {
            let before = original.pixel(i);
            let after = result.pixel(i);
            let avg = clamp_channel(before.average());
            assert_eq!((after.r, after.g, after.b), (avg, avg, avg));
            assert_eq!(after.a, before.a);
        }
    }

    #[test]
    fn test_two_quadrant_layers() {
        let mut doc = doc_with_image(4, 4);
        let top_left = doc.add_layer();
        doc.set_points(top_left, rect(0, 0, 1, 1), Point::new(0, 0));
        doc.set_filter(top_left, FilterKind::Brightness, HistoryMode::Push);
        doc.set_filter_config(top_left, Filter::Brightness(BrightnessConfig { intensity: 2.0 }))
            .unwrap();

        let bottom_right = doc.add_layer();
        doc.set_points(bottom_right, rect(2, 2, 3, 3), Point::new(2, 2));
        doc.set_filter(bottom_right, FilterKind::Grayscale, HistoryMode::Push);

        assert!(doc.generate_result(Refresh::None));
        let original = doc.original_buffer().unwrap().clone();
        let result = doc.working_buffer().unwrap();
        for y in 0..4u32 {
            for x in 0..4u32 {
                let before = original.pixel_at(x, y);
                let after = result.pixel_at(x, y);
                match (x < 2, y < 2) {
                    (true, true) => {
                        assert_eq!(after.r, clamp_channel(before.r as f32 * 2.0));
                        assert_eq!(after.g, clamp_channel(before.g as f32 * 2.0));
                        assert_eq!(after.b, clamp_channel(before.b as f32 * 2.0));
                    }
                    (false, false) => {
                        let avg = clamp_channel(before.average());
                        assert_eq!((after.r, after.g, after.b), (avg, avg, avg));
                    }
                    _ => assert_eq!(after, before),
                }
                assert_eq!(after.a, before.a);
            }
        }
    }

    #[test]
    fn test_generate_without_image_is_noop() {
        let mut doc = Document::with_seed("empty", 1);
        doc.add_layer();
        assert!(!doc.generate_result(Refresh::All));
        assert!(!doc.reset_working_buffer());
        assert!(doc.working_buffer().is_none());
        assert!(doc.generate_frames(3).is_empty());
    }

    #[test]
    fn test_add_and_select() {
        let mut doc = Document::with_seed("test", 0);
        assert_eq!(doc.add_layer(), 0);
        assert_eq!(doc.add_layer(), 1);
        assert_eq!(doc.selected_index(), Some(1));
        assert!(doc.select_layer(0));
        assert!(!doc.select_layer(5));
        assert_eq!(doc.selected_index(), Some(0));
        assert_ne!(doc.layers()[0].id, doc.layers()[1].id);
    }

    #[test]
    fn test_delete_last_layer_clears_selection() {
        let mut doc = Document::with_seed("test", 0);
        doc.add_layer();
        assert!(doc.delete_layer(0));
        assert_eq!(doc.layer_count(), 0);
        assert_eq!(doc.selected_index(), None);
        assert!(!doc.delete_layer(0));
    }

    #[test]
    fn test_delete_reselects_nearest() {
        let mut doc = Document::with_seed("test", 0);
        for _ in 0..3 {
            doc.add_layer();
        }
        assert!(doc.delete_layer(2));
        assert_eq!(doc.selected_index(), Some(1));
        assert!(doc.delete_layer(0));
        assert_eq!(doc.selected_index(), Some(0));
    }

    #[test]
    fn test_move_layer_boundaries() {
        let mut doc = Document::with_seed("test", 0);
        doc.add_layer();
        doc.add_layer();
        let first = doc.layers()[0].id;
        assert!(!doc.move_layer(0, Direction::Up));
        assert!(!doc.move_layer(1, Direction::Down));
        assert!(!doc.move_layer(7, Direction::Down));
        assert_eq!(doc.layers()[0].id, first);

        doc.select_layer(0);
        assert!(doc.move_layer(0, Direction::Down));
        assert_eq!(doc.layers()[1].id, first);
        assert_eq!(doc.selected_index(), Some(1));
    }

    #[test]
    fn test_duplicate_layer_keeps_selection() {
        let mut doc = doc_with_image(4, 4);
        doc.add_layer();
        doc.add_layer();
        doc.set_points(0, rect(0, 0, 1, 1), Point::new(0, 0));
        let selected_id = doc.selected_layer().unwrap().id;
        assert_eq!(doc.duplicate_layer(0), Some(1));
        assert_eq!(doc.layer_count(), 3);
        assert_eq!(doc.selected_layer().unwrap().id, selected_id);
        assert_eq!(doc.layers()[1].selection(), doc.layers()[0].selection());
        assert_eq!(doc.duplicate_layer(9), None);
    }

    #[test]
    fn test_clear_layers() {
        let mut doc = doc_with_image(2, 2);
        doc.add_layer();
        doc.clear_layers();
        assert_eq!(doc.layer_count(), 0);
        assert_eq!(doc.selected_index(), None);
        assert!(!doc.has_image());
    }

    #[test]
    fn test_undo_redo_selection() {
        let mut doc = doc_with_image(4, 4);
        let idx = doc.add_layer();
        assert!(!doc.undo(idx));
        doc.set_points(idx, rect(0, 0, 1, 1), Point::new(0, 0));
        doc.set_points(idx, rect(2, 2, 3, 3), Point::new(2, 2));
        assert!(doc.undo(idx));
        assert_eq!(doc.layer(idx).unwrap().selection().mask, vec![0, 1, 4, 5]);
        assert!(doc.redo(idx));
        assert_eq!(doc.layer(idx).unwrap().selection().mask, vec![10, 11, 14, 15]);
        assert!(!doc.redo(idx));
        assert!(!doc.undo(3));
    }

    #[test]
    fn test_filter_change_replace_present() {
        let mut doc = doc_with_image(4, 4);
        let idx = doc.add_layer();
        doc.set_points(idx, rect(0, 0, 3, 3), Point::new(0, 0));
        doc.set_filter(idx, FilterKind::Slice, HistoryMode::ReplacePresent);
        let layer = doc.layer(idx).unwrap();
        assert_eq!(layer.filter().kind(), FilterKind::Slice);
        assert_eq!(layer.history().past().len(), 1);
    }

    #[test]
    fn test_filter_config_does_not_touch_mask() {
        let mut doc = doc_with_image(4, 4);
        let idx = doc.add_layer();
        doc.set_points(idx, rect(0, 0, 1, 1), Point::new(0, 0));
        doc.set_filter(idx, FilterKind::Slice, HistoryMode::Push);
        let mask = doc.layer(idx).unwrap().selection().mask.clone();
        assert_eq!(
            doc.set_filter_config(idx, Filter::Slice(SliceConfig { intensity: -50.0 })),
            Ok(true)
        );
        assert_eq!(doc.layer(idx).unwrap().selection().mask, mask);
        assert!(matches!(
            doc.set_filter_config(idx, Filter::Grayscale(GrayscaleConfig::default())),
            Err(EditError::FilterMismatch { .. })
        ));
        assert_eq!(doc.set_filter_config(9, Filter::None), Ok(false));
    }

    #[test]
    fn test_set_filter_resets_config() {
        let mut doc = doc_with_image(4, 4);
        let idx = doc.add_layer();
        doc.set_filter(idx, FilterKind::Brightness, HistoryMode::Push);
        doc.set_filter_config(idx, Filter::Brightness(BrightnessConfig { intensity: 0.3 }))
            .unwrap();
        doc.set_filter(idx, FilterKind::Brightness, HistoryMode::Push);
        assert_eq!(
            doc.layer(idx).unwrap().filter(),
            &Filter::Brightness(BrightnessConfig::default())
        );
    }

    #[test]
    fn test_move_selection() {
        let mut doc = doc_with_image(4, 4);
        let idx = doc.add_layer();
        doc.set_points(idx, rect(0, 0, 1, 1), Point::new(0, 0));
        assert!(doc.move_selection(idx, 2, 1));
        let selection = doc.layer(idx).unwrap().selection();
        assert_eq!(selection.start, Point::new(2, 1));
        assert_eq!(selection.mask, vec![6, 7, 10, 11]);
        assert!(!doc.move_selection(4, 1, 1));
    }

    #[test]
    fn test_as_sound_twice_is_stable() {
        let mut doc = doc_with_image(8, 8);
        let idx = doc.add_layer();
        doc.set_filter(idx, FilterKind::AsSound, HistoryMode::Push);
        assert!(doc.generate_result(Refresh::None));
        let first = doc.working_buffer().unwrap().clone();
        assert!(doc.generate_result(Refresh::None));
        assert_eq!(doc.working_buffer().unwrap(), &first);
    }

    #[test]
    fn test_frames_diverge_for_random_filters() {
        let mut doc = doc_with_image(16, 16);
        let idx = doc.add_layer();
        doc.set_filter(idx, FilterKind::FractalPixelSort, HistoryMode::Push);
        let frames = doc.generate_frames(3);
        assert_eq!(frames.len(), 3);
        assert_ne!(frames[0], frames[1]);
        assert!(!doc.is_busy());
    }

    #[test]
    fn test_reset_working_buffer() {
        let mut doc = doc_with_image(4, 4);
        let idx = doc.add_layer();
        doc.set_filter(idx, FilterKind::Grayscale, HistoryMode::Push);
        doc.generate_result(Refresh::None);
        assert_ne!(doc.working_buffer(), doc.original_buffer());
        assert!(doc.reset_working_buffer());
        assert_eq!(doc.working_buffer(), doc.original_buffer());
    }

    #[test]
    fn test_load_image_rerasterizes_masks() {
        let mut doc = Document::with_seed("test", 3);
        let idx = doc.add_layer();
        doc.set_points(idx, rect(0, 0, 1, 1), Point::new(0, 0));
        assert!(doc.layer(idx).unwrap().selection().mask.is_empty());
        doc.load_image(4, 4, vec![0; 64]).unwrap();
        assert_eq!(doc.layer(idx).unwrap().selection().mask, vec![0, 1, 4, 5]);
    }

    #[test]
    fn test_undo_after_shrinking_image() {
        init_logger();
        let mut doc = doc_with_image(8, 8);
        let idx = doc.add_layer();
        doc.set_points(idx, rect(4, 4, 7, 7), Point::new(4, 4));
        doc.set_points(idx, rect(0, 0, 1, 1), Point::new(0, 0));
        doc.set_filter(idx, FilterKind::Grayscale, HistoryMode::ReplacePresent);
        doc.load_image(4, 4, vec![0; 64]).unwrap();

        assert!(doc.undo(idx));
        let selection = doc.layer(idx).unwrap().selection();
        assert_eq!(selection.points, rect(4, 4, 7, 7));
        assert!(selection.mask.iter().all(|&i| i < 16));
        assert!(doc.generate_result(Refresh::All));

        assert!(doc.redo(idx));
        assert_eq!(doc.layer(idx).unwrap().selection().mask, vec![0, 1, 4, 5]);
        assert!(doc.generate_result(Refresh::None));
    }

    #[test]
    fn test_load_image_rerasterizes_undo_entries() {
        let mut doc = Document::with_seed("test", 3);
        let idx = doc.add_layer();
        doc.set_points(idx, rect(0, 0, 1, 1), Point::new(0, 0));
        doc.set_points(idx, rect(2, 2, 3, 3), Point::new(2, 2));
        doc.load_image(4, 4, vec![0; 64]).unwrap();
        assert_eq!(doc.layer(idx).unwrap().selection().mask, vec![10, 11, 14, 15]);
        assert!(doc.undo(idx));
        assert_eq!(doc.layer(idx).unwrap().selection().mask, vec![0, 1, 4, 5]);
    }

    #[test]
    fn test_reload_drops_caches_in_history() {
        let mut doc = doc_with_image(8, 8);
        let idx = doc.add_layer();
        doc.set_filter(idx, FilterKind::PixelSort, HistoryMode::Push);
        assert!(doc.generate_result(Refresh::None));
        assert!(doc.layer(idx).unwrap().filter().cache().is_some_and(|c| !c.is_empty()));
        doc.set_points(idx, rect(0, 0, 3, 3), Point::new(0, 0));
        doc.set_points(idx, rect(1, 1, 3, 3), Point::new(1, 1));

        doc.load_image(8, 8, vec![7; 256]).unwrap();
        for entry in doc.layer(idx).unwrap().history().past() {
            assert!(entry.filter.cache().map_or(true, |c| c.is_empty()));
        }
        assert!(doc.undo(idx));
        assert!(doc.undo(idx));
        assert_eq!(doc.layer(idx).unwrap().filter().kind(), FilterKind::PixelSort);
        assert!(doc.layer(idx).unwrap().filter().cache().is_some_and(|c| c.is_empty()));
        assert!(doc.generate_result(Refresh::None));
        assert!(doc.working_buffer().unwrap().data().iter().all(|&b| b == 7));
    }

    #[test]
    fn test_update_filter_config_merges_fields() {
        let mut doc = doc_with_image(4, 4);
        let idx = doc.add_layer();
        doc.set_filter(idx, FilterKind::Duotone, HistoryMode::Push);
        let before = doc.layer(idx).unwrap().history().past().len();
        let changed = doc.update_filter_config(idx, |filter| {
            if let Filter::Duotone(config) = filter {
                config.contrast = 40.0;
            }
        });
        assert_eq!(changed, Ok(true));
        let layer = doc.layer(idx).unwrap();
        assert_eq!(layer.history().past().len(), before + 1);
        assert_eq!(
            layer.filter(),
            &Filter::Duotone(DuotoneConfig {
                contrast: 40.0,
                ..DuotoneConfig::default()
            })
        );
        assert!(matches!(
            doc.update_filter_config(idx, |filter| *filter = Filter::None),
            Err(EditError::FilterMismatch { .. })
        ));
        assert_eq!(doc.update_filter_config(7, |_| {}), Ok(false));
    }

    #[test]
    fn test_layers_at() {
        let mut doc = doc_with_image(8, 8);
        doc.add_layer();
        doc.add_layer();
        doc.add_layer();
        doc.set_points(0, rect(0, 0, 4, 4), Point::new(0, 0));
        doc.set_points(2, rect(3, 3, 7, 7), Point::new(3, 3));
        assert_eq!(doc.layers_at(&Point::new(3, 3)), vec![2, 0]);
        assert_eq!(doc.layers_at(&Point::new(6, 6)), vec![2]);
        assert!(doc.layers_at(&Point::new(6, 0)).is_empty());
    }

    #[test]
    fn test_busy_markers() {
        let mut doc = Document::new("test");
        assert!(!doc.is_busy());
        doc.begin_busy();
        doc.begin_busy();
        doc.end_busy();
        assert!(doc.is_busy());
        doc.end_busy();
        doc.end_busy();
        assert!(!doc.is_busy());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut doc = doc_with_image(4, 4);
        let idx = doc.add_layer();
        doc.set_points(idx, rect(0, 0, 1, 1), Point::new(0, 0));
        doc.set_filter(idx, FilterKind::Duotone, HistoryMode::Push);
        let json = doc.to_json().unwrap();
        let back = Document::from_json(&json).unwrap();
        assert_eq!(back.id, doc.id);
        assert_eq!(back.layers(), doc.layers());
        assert_eq!(back.selected_index(), Some(idx));
        assert!(!back.has_image());
    }
}
