//! Binary request encoding and ASCII reply decoding.
//!
//! Multi-byte integers travel most-significant-byte-first regardless of host
//! byte order. Replies carry no framing of their own: the channel is strictly
//! half-duplex and a renderer writes its whole reply before doing anything
//! else, so the first non-empty read burst is the complete response.

use std::fmt;

use crate::command::{Request, WindowGeometry, WindowId};

/// Errors that can occur while decoding a renderer reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// An OPEN reply did not parse as a decimal window ID.
    BadWindowId(String),
    /// A WINDOW_INFO reply did not contain exactly five integer fields.
    BadGeometry(String),
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::BadWindowId(reply) => {
                write!(f, "reply is not a window ID: {reply:?}")
            }
            WireError::BadGeometry(reply) => {
                write!(f, "reply is not a 5-field geometry string: {reply:?}")
            }
        }
    }
}

impl std::error::Error for WireError {}

// ---------------------------------------------------------------------------
// Request encoding
// ---------------------------------------------------------------------------

fn put_i32(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

impl Request<'_> {
    /// Encode this command into its transmitted byte sequence: the 4-byte
    /// big-endian tag followed by the command-specific payload.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        put_i32(&mut buf, self.tag());
        match *self {
            Request::Open {
                width,
                height,
                image_count,
                pos_x,
                pos_y,
                testing,
                title,
            } => {
                for v in [width, height, image_count, pos_x, pos_y, i32::from(testing)] {
                    put_i32(&mut buf, v);
                }
                put_i32(&mut buf, title.len() as i32);
                buf.extend_from_slice(title.as_bytes());
            }
            Request::Close { window }
            | Request::WindowInfo { window }
            | Request::Checksums { window } => {
                put_i32(&mut buf, window.0);
            }
            Request::UpdateImages { window, images } => {
                put_i32(&mut buf, window.0);
                for image in images {
                    put_i32(&mut buf, image.len() as i32);
                    buf.extend_from_slice(image);
                }
            }
        }
        buf
    }

    fn encoded_len(&self) -> usize {
        4 + match *self {
            Request::Open { title, .. } => 7 * 4 + title.len(),
            Request::Close { .. } | Request::WindowInfo { .. } | Request::Checksums { .. } => 4,
            Request::UpdateImages { images, .. } => {
                4 + images.iter().map(|i| 4 + i.len()).sum::<usize>()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Reply decoding
// ---------------------------------------------------------------------------

/// Parse an OPEN reply: the new window's ID as a decimal ASCII integer.
pub fn parse_window_id(reply: &[u8]) -> Result<WindowId, WireError> {
    let text = String::from_utf8_lossy(reply);
    match text.trim().parse::<i32>() {
        Ok(id) => Ok(WindowId(id)),
        Err(_) => Err(WireError::BadWindowId(text.into_owned())),
    }
}

/// Parse a WINDOW_INFO reply: `width|height|posX|posY|imageCount`.
pub fn parse_geometry(reply: &[u8]) -> Result<WindowGeometry, WireError> {
    let text = String::from_utf8_lossy(reply).into_owned();
    let fields = text
        .trim()
        .split('|')
        .map(|part| part.parse::<i32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| WireError::BadGeometry(text.clone()))?;
    if fields.len() != 5 {
        return Err(WireError::BadGeometry(text));
    }
    Ok(WindowGeometry {
        width: fields[0],
        height: fields[1],
        pos_x: fields[2],
        pos_y: fields[3],
        image_count: fields[4],
    })
}

/// Parse a CHECKSUM reply: `|`-joined hex digest strings, one per image slot.
pub fn parse_checksums(reply: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(reply)
        .split('|')
        .map(str::to_owned)
        .collect()
}

/// Whether a reply acknowledges the command. Any non-empty byte string does.
pub fn is_ack(reply: &[u8]) -> bool {
    !reply.is_empty()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
