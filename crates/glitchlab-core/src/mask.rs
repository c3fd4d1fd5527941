//! Polygon rasterization into pixel masks.
//!
//! A mask is a cached rasterization of a selection path over the image grid.
//! Layers store it as a sorted list of flattened pixel indices; an empty list
//! means "no usable selection" and is widened to the whole image when a
//! filter runs.

use crate::geometry::{Point, Polygon};

/// A boolean coverage grid the size of the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl Mask {
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width as usize * height as usize],
        }
    }

    pub fn full(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![true; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.bits[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        if x < self.width && y < self.height {
            self.bits[(y * self.width + x) as usize] = value;
        }
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.bits.iter().any(|b| *b)
    }

    /// Flattened `y * width + x` indices of every covered pixel, ascending.
    pub fn to_indices(&self) -> Vec<u32> {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, b)| **b)
            .map(|(i, _)| i as u32)
            .collect()
    }

    pub fn from_indices(width: u32, height: u32, indices: &[u32]) -> Self {
        let mut mask = Self::empty(width, height);
        for &i in indices {
            if let Some(bit) = mask.bits.get_mut(i as usize) {
                *bit = true;
            }
        }
        mask
    }
}

/// Rasterize a closed path over a `width x height` grid.
///
/// Paths with one point or fewer produce an empty mask.
pub fn rasterize(points: &[Point], width: u32, height: u32) -> Mask {
    let mut mask = Mask::empty(width, height);
    if points.len() <= 1 {
        return mask;
    }
    let polygon = Polygon::new(points.to_vec());
    // Pixels outside the bounding box can never be inside the polygon.
    let Some(bounds) = polygon.bbox().and_then(|bb| bb.clip_to_grid(width, height)) else {
        return mask;
    };
    for y in bounds.min.y..=bounds.max.y {
        for x in bounds.min.x..=bounds.max.x {
            if polygon.contains(&Point::new(x, y)) {
                mask.set(x as u32, y as u32, true);
            }
        }
    }
    log::debug!(
        "Rasterized {} points into {} pixels ({}x{})",
        points.len(),
        mask.count(),
        width,
        height
    );
    mask
}

/// Rasterize straight to the index list stored on a selection.
pub fn rasterize_indices(points: &[Point], width: u32, height: u32) -> Vec<u32> {
    rasterize(points, width, height).to_indices()
}

/// Every pixel index of a `width x height` image.
pub fn full_indices(width: u32, height: u32) -> Vec<u32> {
    (0..width * height).collect()
}

/// The select-all path used when a draw gesture produced no usable polygon.
pub fn select_all_points(width: u32, height: u32) -> Vec<Point> {
    let max_x = width.saturating_sub(1) as i32;
    let max_y = height.saturating_sub(1) as i32;
    vec![
        Point::new(0, 0),
        Point::new(max_x, 0),
        Point::new(max_x, max_y),
        Point::new(0, max_y),
    ]
}
