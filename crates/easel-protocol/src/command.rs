//! Core protocol types: window identifier, window geometry, and the request
//! variants the controller can send.

use std::fmt;

use crate::tag;

// ---------------------------------------------------------------------------
// Core ID type
// ---------------------------------------------------------------------------

/// Identifier of a renderer-managed window.
///
/// IDs are assigned by the renderer (starting from 1), never by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub i32);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// WindowGeometry
// ---------------------------------------------------------------------------

/// Decoded WINDOW_INFO reply: dimensions, screen position and image slot
/// count, in the order the renderer reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub width: i32,
    pub height: i32,
    pub pos_x: i32,
    pub pos_y: i32,
    pub image_count: i32,
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A command to the renderer, one variant per wire tag.
///
/// Payload shapes are fixed by the wire contract; [`Request::encode`] in the
/// `wire` module produces the transmitted bytes.
#[derive(Debug, Clone, Copy)]
pub enum Request<'a> {
    /// Open a new window. The reply is the renderer-assigned window ID as a
    /// decimal ASCII integer.
    Open {
        width: i32,
        height: i32,
        image_count: i32,
        /// Negative coordinates let the renderer choose the placement.
        pos_x: i32,
        pos_y: i32,
        /// Enables checksum tracking in the renderer. Increases its memory
        /// usage; meant for tests only.
        testing: bool,
        title: &'a str,
    },
    /// Close a window. Any non-empty reply acknowledges the close.
    Close { window: WindowId },
    /// Replace the window's images, one blob per slot in slot order. The
    /// blob count must match the window's configured slot count. Any
    /// non-empty reply acknowledges the update.
    UpdateImages {
        window: WindowId,
        images: &'a [Vec<u8>],
    },
    /// Query window geometry. The reply is `width|height|posX|posY|imageCount`.
    WindowInfo { window: WindowId },
    /// Testing-only: query per-slot content hashes, `|`-joined hex strings.
    Checksums { window: WindowId },
}

impl Request<'_> {
    /// The 4-byte big-endian tag that leads this command on the wire.
    pub fn tag(&self) -> i32 {
        match self {
            Request::Open { .. } => tag::OPEN,
            Request::Close { .. } => tag::CLOSE,
            Request::UpdateImages { .. } => tag::UPDATE_IMG,
            Request::WindowInfo { .. } => tag::WINDOW_INFO,
            Request::Checksums { .. } => tag::CHECKSUM,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_id_display() {
        assert_eq!(WindowId(7).to_string(), "7");
        assert_eq!(WindowId(-1).to_string(), "-1");
    }

    #[test]
    fn request_tags_match_wire_contract() {
        let w = WindowId(1);
        assert_eq!(
            Request::Open {
                width: 1,
                height: 1,
                image_count: 1,
                pos_x: -1,
                pos_y: -1,
                testing: false,
                title: "",
            }
            .tag(),
            1
        );
        assert_eq!(Request::Close { window: w }.tag(), 2);
        assert_eq!(
            Request::UpdateImages {
                window: w,
                images: &[],
            }
            .tag(),
            3
        );
        assert_eq!(Request::WindowInfo { window: w }.tag(), 4);
        assert_eq!(Request::Checksums { window: w }.tag(), 5);
    }
}
