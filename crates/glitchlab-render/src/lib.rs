//! # Glitchlab Render
//!
//! Render-ready views of a [`glitchlab_core::Document`] for UI collaborators:
//! the layer list, the active selection outline, and the mapping from
//! pointer positions to canvas pixels.
//!
//! Everything here is plain serializable data; drawing happens in the
//! frontend.

pub mod render_data;
pub mod viewport;

pub use render_data::{LayerListEntry, RenderFrame, SelectionOutline};
pub use viewport::CanvasViewport;
