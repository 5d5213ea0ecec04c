//! Easel client — display and update pixel images in windows managed by an
//! external renderer process, without implementing any graphics.
//!
//! The controller spawns the renderer with its stdin/stdout captured as
//! anonymous pipes and drives it over a synchronous binary protocol: one
//! request in flight, replies consumed before the next request is written.
//! Window IDs are assigned by the renderer and tracked in a registry so
//! stale handles fail locally, and an unexpected renderer death invalidates
//! every window at once and fires a termination callback exactly once.
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut easel = Easel::launch(LaunchConfig::new("/opt/easel/renderer"))?;
//! easel.on_termination(|| std::process::exit(0));
//!
//! let id = easel.open("plot", WindowOptions::sized(640, 480))?.unwrap();
//! easel.update(id, &[Frame::Encoded(jpeg_bytes)])?;
//! ```

pub mod channel;
pub mod config;
pub mod controller;
pub mod error;
pub mod frame;
pub mod registry;
pub mod supervisor;

// channel
pub use channel::{SyncChannel, Transport};

// config
pub use config::{LaunchConfig, StderrMode};

// controller
pub use controller::{Easel, WindowOptions};

// error
pub use error::{Error, Result};

// frame
pub use frame::Frame;

// registry
pub use registry::WindowRegistry;

// supervisor
pub use supervisor::Supervisor;

// Protocol types surface in the public API.
pub use easel_protocol::{WindowGeometry, WindowId};

// Bitmap type handed out by `animate`.
pub use image::RgbImage;
