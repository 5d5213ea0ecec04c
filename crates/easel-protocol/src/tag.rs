//! Command tag constants, transmitted as 4-byte big-endian integers.

pub const OPEN: i32 = 1;
pub const CLOSE: i32 = 2;
pub const UPDATE_IMG: i32 = 3;
pub const WINDOW_INFO: i32 = 4;
/// Testing-only capability: per-slot content hashes of the last update.
pub const CHECKSUM: i32 = 5;
