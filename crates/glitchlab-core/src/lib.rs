//! # Glitchlab Core
//!
//! Editing core for a layered glitch-art image editor: polygon selections
//! rasterized into pixel masks, a registry of pixel filters, per-layer
//! undo/redo, and the compositor that replays every layer over the source
//! image.
//!
//! All randomness flows through an injected, seedable RNG so results can be
//! pinned in tests.

pub mod commands;
pub mod compositor;
pub mod document;
pub mod draw;
pub mod error;
pub mod filters;
pub mod geometry;
pub mod layer;
pub mod mask;
pub mod pixel;
pub mod sound;
pub mod spatial;

pub use commands::CommandStack;
pub use compositor::{composite, Refresh};
pub use document::Document;
pub use draw::{DrawSession, MoveGesture};
pub use error::EditError;
pub use filters::{Filter, FilterKind, ParamRange};
pub use geometry::{BBox, Point, Polygon};
pub use layer::{Direction, HistoryMode, Layer, LayerId, Selection};
pub use mask::{rasterize, Mask};
pub use pixel::{Color, PixelBuffer, Rgb};
