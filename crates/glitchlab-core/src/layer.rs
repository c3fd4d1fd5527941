use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::commands::CommandStack;
use crate::filters::Filter;
use crate::geometry::{BBox, Point};
use crate::pixel::Rgb;

/// Unique layer identifier.
pub type LayerId = Uuid;

/// The polygon-derived state of one layer.
///
/// `mask` is the rasterization of `points` and is recomputed whenever the
/// points change. Filter edits leave it alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// The path as drawn; consecutive points form the polygon edges.
    pub points: Vec<Point>,
    /// First point of the path, re-appended when the path is closed.
    pub start: Point,
    /// Flattened pixel indices inside the polygon. Empty means whole image.
    pub mask: Vec<u32>,
    pub filter: Filter,
}

impl Selection {
    pub fn bbox(&self) -> Option<BBox> {
        BBox::from_points(&self.points)
    }

    /// The path closed back onto its start point, as drawn on screen.
    pub fn closed_path(&self) -> Vec<Point> {
        let mut path = self.points.clone();
        if !path.is_empty() {
            path.push(self.start);
        }
        path
    }

    pub fn has_points(&self) -> bool {
        !self.points.is_empty()
    }
}

/// One selection + filter pair composited over the base image.
///
/// The current selection is the present entry of the layer's history, so the
/// two can never disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    /// UI tag used to tell layers apart.
    pub color: Rgb,
    history: CommandStack<Selection>,
}

impl Layer {
    pub fn new(color: Rgb) -> Self {
        Self {
            id: Uuid::new_v4(),
            color,
            history: CommandStack::new(Selection::default()),
        }
    }

    /// A new empty layer with a random color tag.
    pub fn with_random_color(rng: &mut dyn RngCore) -> Self {
        Self::new(random_color(rng))
    }

    pub fn selection(&self) -> &Selection {
        self.history.present()
    }

    pub fn filter(&self) -> &Filter {
        &self.selection().filter
    }

    pub fn history(&self) -> &CommandStack<Selection> {
        &self.history
    }

    /// Record `selection` according to `mode`.
    pub fn update(&mut self, selection: Selection, mode: HistoryMode) {
        let history = std::mem::take(&mut self.history);
        self.history = match mode {
            HistoryMode::Push => history.set(selection),
            HistoryMode::ReplacePresent => history.replace_present(selection),
        };
    }

    /// Apply `f` to every history entry, present and undo/redo alike,
    /// without recording a step.
    pub fn rewrite_history(&mut self, f: impl FnMut(Selection) -> Selection) {
        self.history = std::mem::take(&mut self.history).map(f);
    }

    pub fn undo(&mut self) -> bool {
        if !self.history.can_undo() {
            return false;
        }
        self.history = std::mem::take(&mut self.history).undo();
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.history.can_redo() {
            return false;
        }
        self.history = std::mem::take(&mut self.history).redo();
        true
    }

    /// A copy with a fresh id and color tag. History is carried over.
    pub fn duplicate(&self, rng: &mut dyn RngCore) -> Self {
        Self {
            id: Uuid::new_v4(),
            color: random_color(rng),
            history: self.history.clone(),
        }
    }
}

/// How a selection change is recorded in the layer history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HistoryMode {
    /// A normal undoable step.
    #[default]
    Push,
    /// Overwrite the present entry, leaving past and future untouched. Used
    /// for edits that belong to a draw that is still pending.
    ReplacePresent,
}

/// Direction for [`crate::Document::move_layer`]. Up is towards index 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
}

pub fn random_color(rng: &mut dyn RngCore) -> Rgb {
    Rgb::new(rng.random(), rng.random(), rng.random())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterKind;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn with_points(points: Vec<Point>) -> Selection {
        Selection {
            start: points[0],
            points,
            ..Selection::default()
        }
    }

    #[test]
    fn test_new_layer_is_empty() {
        let layer = Layer::new(Rgb::default());
        assert!(!layer.selection().has_points());
        assert_eq!(layer.filter().kind(), FilterKind::None);
        assert!(!layer.history().can_undo());
    }

    #[test]
    fn test_update_push_and_undo() {
        let mut layer = Layer::new(Rgb::default());
        layer.update(with_points(vec![Point::new(1, 1), Point::new(2, 2)]), HistoryMode::Push);
        assert!(layer.selection().has_points());
        assert!(layer.undo());
        assert!(!layer.selection().has_points());
        assert!(!layer.undo());
        assert!(layer.redo());
        assert!(!layer.redo());
        assert_eq!(layer.selection().points.len(), 2);
    }

    #[test]
    fn test_replace_present_records_no_step() {
        let mut layer = Layer::new(Rgb::default());
        let mut selection = layer.selection().clone();
        selection.filter = FilterKind::Grayscale.default_config();
        layer.update(selection, HistoryMode::ReplacePresent);
        assert_eq!(layer.filter().kind(), FilterKind::Grayscale);
        assert!(!layer.history().can_undo());
    }

    #[test]
    fn test_rewrite_history_reaches_undo_entries() {
        let mut layer = Layer::new(Rgb::default());
        layer.update(with_points(vec![Point::new(0, 0), Point::new(1, 1)]), HistoryMode::Push);
        layer.update(with_points(vec![Point::new(2, 2), Point::new(3, 3)]), HistoryMode::Push);
        layer.rewrite_history(|mut s| {
            s.mask = vec![s.points.len() as u32];
            s
        });
        assert_eq!(layer.selection().mask, vec![2]);
        assert!(layer.undo());
        assert_eq!(layer.selection().mask, vec![2]);
        assert!(layer.undo());
        assert_eq!(layer.selection().mask, vec![0]);
        assert!(!layer.undo());
    }

    #[test]
    fn test_closed_path() {
        let selection = with_points(vec![Point::new(0, 0), Point::new(3, 0), Point::new(3, 3)]);
        let path = selection.closed_path();
        assert_eq!(path.len(), 4);
        assert_eq!(path[3], Point::new(0, 0));
        assert!(Selection::default().closed_path().is_empty());
    }

    #[test]
    fn test_duplicate_gets_new_identity() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut layer = Layer::with_random_color(&mut rng);
        layer.update(with_points(vec![Point::new(0, 0), Point::new(1, 1)]), HistoryMode::Push);
        let copy = layer.duplicate(&mut rng);
        assert_ne!(copy.id, layer.id);
        assert_eq!(copy.selection(), layer.selection());
        assert!(copy.history().can_undo());
    }
}
