use thiserror::Error;

use crate::filters::FilterKind;

/// Errors raised by the editing core.
///
/// Stale layer indices, a missing image and exhausted undo history are not
/// errors: those operations log and return `false` / `None` instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error("RGBA buffer has {actual} bytes, expected {expected}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("Image must have a non-zero width and height")]
    EmptyImage,

    #[error("Invalid hex color '{0}'")]
    InvalidHexColor(String),

    #[error("Layer uses filter {expected:?}, got a config for {actual:?}")]
    FilterMismatch {
        expected: FilterKind,
        actual: FilterKind,
    },
}
