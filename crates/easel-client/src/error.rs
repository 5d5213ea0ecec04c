//! Error types for the client library.
//!
//! Renderer death is deliberately NOT represented here: once the renderer is
//! gone, ordinary operations degrade to a "no response" result (`Ok(None)`,
//! `Ok(false)`) and only the termination callback observes the event. Errors
//! are reserved for conditions the caller must handle: local misuse detected
//! before any I/O, launch failures, and protocol-level mismatches.

use std::path::PathBuf;

use easel_protocol::{WindowId, WireError};

/// Errors surfaced by [`Easel`](crate::Easel) operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The renderer executable does not exist at the configured path.
    #[error("renderer executable not found: {0:?}")]
    MissingRenderer(PathBuf),

    /// The OS refused to spawn the renderer process.
    #[error("failed to launch renderer: {0}")]
    Spawn(#[source] std::io::Error),

    /// An operation referenced a window ID that is not currently open.
    /// Raised before any I/O takes place.
    #[error("no open window with ID {0}")]
    UnknownWindow(WindowId),

    /// `update` was called with an empty set of images.
    #[error("update requires at least one image")]
    NoImages,

    /// A renderer reply did not match its expected shape. Indicates a
    /// protocol or version mismatch the caller cannot safely ignore.
    #[error("malformed renderer response: {0}")]
    MalformedResponse(#[from] WireError),

    /// A bitmap could not be encoded to JPEG for transmission.
    #[error("image encoding failed: {0}")]
    ImageEncode(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
