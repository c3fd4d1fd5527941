use glitchlab_core::Point;
use serde::{Deserialize, Serialize};

/// Maps pointer positions on a scaled canvas element to image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasViewport {
    /// Canvas backing size in image pixels.
    pub canvas_width: f64,
    pub canvas_height: f64,
    /// Left edge of the displayed canvas in client coordinates.
    pub left: f64,
    /// Top edge of the displayed canvas in client coordinates.
    pub top: f64,
    /// Displayed size in client coordinates.
    pub display_width: f64,
    pub display_height: f64,
}

impl CanvasViewport {
    /// A canvas displayed at its native size at the client origin.
    pub fn new(canvas_width: u32, canvas_height: u32) -> Self {
        Self {
            canvas_width: canvas_width as f64,
            canvas_height: canvas_height as f64,
            left: 0.0,
            top: 0.0,
            display_width: canvas_width as f64,
            display_height: canvas_height as f64,
        }
    }

    /// Update where and how large the canvas is displayed.
    pub fn set_display_rect(&mut self, left: f64, top: f64, width: f64, height: f64) {
        self.left = left;
        self.top = top;
        self.display_width = width;
        self.display_height = height;
    }

    /// Fit the canvas inside a container, preserving its aspect ratio and
    /// centering it.
    pub fn fit_within(&mut self, container_width: f64, container_height: f64) {
        if self.canvas_width <= 0.0 || self.canvas_height <= 0.0 {
            return;
        }
        let scale = (container_width / self.canvas_width).min(container_height / self.canvas_height);
        self.display_width = self.canvas_width * scale;
        self.display_height = self.canvas_height * scale;
        self.left = (container_width - self.display_width) / 2.0;
        self.top = (container_height - self.display_height) / 2.0;
    }

    pub fn scale_x(&self) -> f64 {
        self.canvas_width / self.display_width
    }

    pub fn scale_y(&self) -> f64 {
        self.canvas_height / self.display_height
    }

    /// Convert a client position to the nearest canvas pixel.
    pub fn client_to_canvas(&self, client_x: f64, client_y: f64) -> Point {
        Point::new(
            ((client_x - self.left) * self.scale_x()).round() as i32,
            ((client_y - self.top) * self.scale_y()).round() as i32,
        )
    }

    /// Convert a canvas pixel to client coordinates.
    pub fn canvas_to_client(&self, point: &Point) -> (f64, f64) {
        (
            point.x as f64 / self.scale_x() + self.left,
            point.y as f64 / self.scale_y() + self.top,
        )
    }
}
