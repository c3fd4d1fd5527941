use serde::{Deserialize, Serialize};

/// A pixel coordinate, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Saturates at the `i32` range instead of overflowing.
    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Flattened `y * width + x` index, or `None` when the point is off the grid.
    pub fn to_index(&self, width: u32, height: u32) -> Option<u32> {
        if self.x < 0 || self.y < 0 || self.x as u32 >= width || self.y as u32 >= height {
            return None;
        }
        Some(self.y as u32 * width + self.x as u32)
    }
}

/// An inclusive, axis-aligned pixel bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut min = *first;
        let mut max = *first;
        for p in &points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some(Self { min, max })
    }

    /// Number of pixel columns covered (`max.x - min.x + 1`).
    pub fn width(&self) -> i32 {
        self.max.x.saturating_sub(self.min.x).saturating_add(1)
    }

    /// Number of pixel rows covered (`max.y - min.y + 1`).
    pub fn height(&self) -> i32 {
        self.max.y.saturating_sub(self.min.y).saturating_add(1)
    }

    /// The `(width, height, min_x, min_y)` tuple used for localized pixel math.
    pub fn dimensions(&self) -> (i32, i32, i32, i32) {
        (self.width(), self.height(), self.min.x, self.min.y)
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self {
            min: self.min.translate(dx, dy),
            max: self.max.translate(dx, dy),
        }
    }

    /// Clip to the `[0, width) x [0, height)` pixel grid.
    pub fn clip_to_grid(&self, width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let max_x = (width - 1) as i32;
        let max_y = (height - 1) as i32;
        let clipped = Self {
            min: Point::new(self.min.x.max(0), self.min.y.max(0)),
            max: Point::new(self.max.x.min(max_x), self.max.y.min(max_y)),
        };
        if clipped.min.x > clipped.max.x || clipped.min.y > clipped.max.y {
            return None;
        }
        Some(clipped)
    }
}

/// A closed polygon; the last vertex connects back to the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<Point>,
}

impl Polygon {
    pub fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    pub fn bbox(&self) -> Option<BBox> {
        BBox::from_points(&self.vertices)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self {
            vertices: self.vertices.iter().map(|p| p.translate(dx, dy)).collect(),
        }
    }

    /// Edges as `(from, to)` pairs, wrapping the last vertex to the first.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[(i + n - 1) % n], self.vertices[i]))
    }

    /// Even-odd test with a ray cast towards +x. Points lying exactly on an
    /// edge count as inside.
    pub fn contains(&self, p: &Point) -> bool {
        if self.vertices.len() <= 1 {
            return false;
        }
        let mut inside = false;
        for (a, b) in self.edges() {
            if on_segment(p, &a, &b) {
                return true;
            }
            if (b.y > p.y) != (a.y > p.y) {
                // x of the edge at row p.y, compared without division
                let lhs = (p.x as i128 - b.x as i128) * (a.y as i128 - b.y as i128);
                let rhs = (a.x as i128 - b.x as i128) * (p.y as i128 - b.y as i128);
                let crosses = if a.y > b.y { lhs < rhs } else { lhs > rhs };
                if crosses {
                    inside = !inside;
                }
            }
        }
        inside
    }
}

fn on_segment(p: &Point, a: &Point, b: &Point) -> bool {
    let (px, py) = (p.x as i128, p.y as i128);
    let (ax, ay, bx, by) = (a.x as i128, a.y as i128, b.x as i128, b.y as i128);
    let cross = (bx - ax) * (py - ay) - (by - ay) * (px - ax);
    cross == 0
        && p.x >= a.x.min(b.x)
        && p.x <= a.x.max(b.x)
        && p.y >= a.y.min(b.y)
        && p.y <= a.y.max(b.y)
}

/// Translate every point of a path.
pub fn translate_points(points: &[Point], dx: i32, dy: i32) -> Vec<Point> {
    points.iter().map(|p| p.translate(dx, dy)).collect()
}
