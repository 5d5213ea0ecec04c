//! Wire protocol for driving an Easel renderer process.
//!
//! This crate defines the binary command encoding (a 4-byte big-endian tag
//! followed by a command-specific payload), the ASCII reply decoders, and the
//! legacy text-protocol codec kept for compatibility with older renderers.
//!
//! Everything here is a pure function over byte buffers — no I/O, no process
//! state. The client crate owns the renderer process and the pipes.

pub mod legacy;
pub mod tag;

mod command;
mod wire;

// command
pub use command::{Request, WindowGeometry, WindowId};

// wire
pub use wire::{is_ack, parse_checksums, parse_geometry, parse_window_id, WireError};
