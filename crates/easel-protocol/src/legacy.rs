//! Legacy text protocol, kept for compatibility with first-generation
//! renderers.
//!
//! A command is a single ASCII digit concatenated directly with a
//! `#--0--#`-delimited field string; images travel base64-encoded; every
//! message, request and response alike, ends with a two-byte `\0\0`
//! sentinel. The variant is incompatible with the binary protocol and a
//! renderer implements exactly one of the two.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::command::WindowId;
use crate::tag;

/// Field separator within a request payload.
pub const BOUNDARY: &str = "#--0--#";

/// Message sentinel, terminating both requests and responses.
pub const TERMINATOR: &[u8] = b"\0\0";

fn message(tag: i32, fields: &[String]) -> Vec<u8> {
    let mut buf = format!("{tag}{}", fields.join(BOUNDARY)).into_bytes();
    buf.extend_from_slice(TERMINATOR);
    buf
}

/// Encode an open-window request: title, dimensions and image slot count.
pub fn encode_open(title: &str, width: i32, height: i32, image_count: i32) -> Vec<u8> {
    message(
        tag::OPEN,
        &[
            title.to_owned(),
            width.to_string(),
            height.to_string(),
            image_count.to_string(),
        ],
    )
}

/// Encode a close-window request.
pub fn encode_close(window: WindowId) -> Vec<u8> {
    message(tag::CLOSE, &[window.to_string()])
}

/// Encode an image-update request. Each image is base64-encoded and appended
/// after the window ID in slot order.
pub fn encode_update(window: WindowId, images: &[&[u8]]) -> Vec<u8> {
    let mut fields = vec![window.to_string()];
    fields.extend(images.iter().map(|image| BASE64.encode(image)));
    message(tag::UPDATE_IMG, &fields)
}

/// Decode a reply from an accumulation buffer.
///
/// Returns `Some((total_consumed_bytes, payload))` once the `\0\0` sentinel
/// has arrived, `None` while the reply is still incomplete.
pub fn decode_reply(buf: &[u8]) -> Option<(usize, Vec<u8>)> {
    let end = buf
        .windows(TERMINATOR.len())
        .position(|w| w == TERMINATOR)?;
    Some((end + TERMINATOR.len(), buf[..end].to_vec()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
