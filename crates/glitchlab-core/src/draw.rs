//! Pointer gesture state for drawing and moving selections.
//!
//! Both types only collect points; they hand the result to a [`Document`]
//! when the gesture ends.

use crate::document::Document;
use crate::geometry::{translate_points, BBox, Point};
use crate::layer::Selection;
use crate::mask::select_all_points;

/// Collects the points of a freehand lasso between press and release.
#[derive(Debug, Clone, Default)]
pub struct DrawSession {
    width: u32,
    height: u32,
    points: Vec<Point>,
    start: Option<Point>,
    drawing: bool,
}

impl DrawSession {
    /// A session for an image of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn begin(&mut self, point: Point) {
        self.drawing = true;
        self.start = Some(point);
        self.points = vec![point];
    }

    /// Ignored unless a gesture is in progress.
    pub fn update(&mut self, point: Point) {
        if self.drawing {
            self.points.push(point);
        }
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// Points collected so far, for live preview.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn start(&self) -> Option<Point> {
        self.start
    }

    /// End the gesture and return the closed path and its start point.
    ///
    /// A click without movement selects the whole image.
    pub fn finish(&mut self) -> Option<(Vec<Point>, Point)> {
        if !self.drawing {
            return None;
        }
        self.drawing = false;
        if self.points.len() <= 1 {
            self.points = select_all_points(self.width, self.height);
            self.start = self.points.first().copied();
        } else if let Some(start) = self.start {
            self.points.push(start);
        }
        let start = self.start?;
        log::debug!("Draw finished with {} points", self.points.len());
        Some((std::mem::take(&mut self.points), start))
    }

    pub fn reset(&mut self) {
        self.points.clear();
        self.start = None;
        self.drawing = false;
    }
}

/// Drag of an existing selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveGesture {
    origin: Point,
    current: Point,
}

impl MoveGesture {
    /// Start a drag if `press` lies inside the selection's bounding box.
    pub fn begin(selection: &Selection, press: Point) -> Option<Self> {
        let bbox = selection.bbox()?;
        if !bbox.contains_point(&press) {
            return None;
        }
        Some(Self {
            origin: press,
            current: press,
        })
    }

    pub fn update(&mut self, point: Point) {
        self.current = point;
    }

    /// Total `(dx, dy)` since the press, saturating at the `i32` range.
    pub fn offset(&self) -> (i32, i32) {
        (
            self.current.x.saturating_sub(self.origin.x),
            self.current.y.saturating_sub(self.origin.y),
        )
    }

    /// The selection path as it would look if released now.
    pub fn preview(&self, selection: &Selection) -> Vec<Point> {
        let (dx, dy) = self.offset();
        translate_points(&selection.points, dx, dy)
    }

    pub fn preview_bbox(&self, selection: &Selection) -> Option<BBox> {
        let (dx, dy) = self.offset();
        selection.bbox().map(|bb| bb.translate(dx, dy))
    }

    /// Apply the drag to layer `index`. A zero offset records nothing.
    pub fn finish(self, document: &mut Document, index: usize) -> bool {
        let (dx, dy) = self.offset();
        if dx == 0 && dy == 0 {
            return false;
        }
        document.move_selection(index, dx, dy)
    }
}
