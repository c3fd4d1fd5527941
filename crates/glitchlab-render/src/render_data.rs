use glitchlab_core::{Document, Layer, Rgb};
use serde::{Deserialize, Serialize};

/// Dash pattern for selection outlines: 5px on, 3px off.
pub const OUTLINE_DASH: [f32; 2] = [5.0, 3.0];
pub const OUTLINE_WIDTH: f32 = 2.0;
pub const OUTLINE_FILL_ALPHA: f32 = 0.3;

/// One row of the layer list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerListEntry {
    pub id: String,
    /// Hex color tag, `#rrggbb`.
    pub color: String,
    pub filter_name: String,
    pub active: bool,
}

impl LayerListEntry {
    pub fn from_layer(layer: &Layer, active: bool) -> Self {
        Self {
            id: layer.id.to_string(),
            color: layer.color.to_hex(),
            filter_name: layer.filter().name().to_string(),
            active,
        }
    }
}

/// A selection path ready to be stroked and filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionOutline {
    /// Flat closed path: [x0, y0, x1, y1, ..., x0, y0]
    pub vertices: Vec<f64>,
    pub stroke: [f32; 4],
    pub fill: [f32; 4],
    pub dash: [f32; 2],
    pub line_width: f32,
}

impl SelectionOutline {
    /// `None` for a layer that has no path yet.
    pub fn from_layer(layer: &Layer) -> Option<Self> {
        let selection = layer.selection();
        if !selection.has_points() {
            return None;
        }
        let vertices = selection
            .closed_path()
            .iter()
            .flat_map(|p| [p.x as f64, p.y as f64])
            .collect();
        Some(Self::with_color(vertices, layer.color))
    }

    fn with_color(vertices: Vec<f64>, color: Rgb) -> Self {
        Self {
            vertices,
            stroke: color.to_f32_array(1.0),
            fill: color.to_f32_array(OUTLINE_FILL_ALPHA),
            dash: OUTLINE_DASH,
            line_width: OUTLINE_WIDTH,
        }
    }
}

/// Everything a frontend needs to draw the editor for one update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub width: u32,
    pub height: u32,
    pub layers: Vec<LayerListEntry>,
    /// Outline of the selected layer only.
    pub selection: Option<SelectionOutline>,
    pub busy: bool,
}

impl RenderFrame {
    pub fn from_document(document: &Document) -> Self {
        let (width, height) = document.dimensions().unwrap_or((0, 0));
        let selected = document.selected_index();
        let layers = document
            .layers()
            .iter()
            .enumerate()
            .map(|(i, layer)| LayerListEntry::from_layer(layer, selected == Some(i)))
            .collect::<Vec<_>>();
        log::debug!(
            "Render frame {}x{} with {} layers, selected {:?}",
            width,
            height,
            layers.len(),
            selected
        );
        Self {
            width,
            height,
            layers,
            selection: document.selected_layer().and_then(SelectionOutline::from_layer),
            busy: document.is_busy(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
