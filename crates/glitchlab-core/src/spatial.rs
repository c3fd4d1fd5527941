use rstar::{Envelope, PointDistance, RTree, RTreeObject, AABB};

use crate::geometry::{BBox, Point};

/// An entry in the R-tree, referencing a layer by its index.
#[derive(Debug, Clone)]
pub struct SelectionEntry {
    /// Index into the document's layer list.
    pub layer_index: usize,
    /// Bounding box of the layer's selection path.
    pub bbox: BBox,
}

impl RTreeObject for SelectionEntry {
    type Envelope = AABB<[i64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bbox.min.x as i64, self.bbox.min.y as i64],
            [self.bbox.max.x as i64, self.bbox.max.y as i64],
        )
    }
}

impl PointDistance for SelectionEntry {
    fn distance_2(&self, point: &[i64; 2]) -> i64 {
        self.envelope().distance_2(point)
    }

    fn contains_point(&self, point: &[i64; 2]) -> bool {
        self.envelope().contains_point(point)
    }
}

/// Spatial index over selection bounding boxes, used for hit testing.
pub struct SelectionIndex {
    tree: RTree<SelectionEntry>,
}

impl SelectionIndex {
    pub fn build(entries: Vec<SelectionEntry>) -> Self {
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Layer indices whose selection box contains `point`, topmost first.
    pub fn query_point(&self, point: &Point) -> Vec<usize> {
        let mut hits: Vec<usize> = self
            .tree
            .locate_all_at_point(&[point.x as i64, point.y as i64])
            .map(|e| e.layer_index)
            .collect();
        hits.sort_unstable_by(|a, b| b.cmp(a));
        hits
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
