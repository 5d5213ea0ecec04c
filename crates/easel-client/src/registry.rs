//! Registry of currently-open window IDs.
//!
//! Every window-targeting operation verifies its ID here before any I/O, so
//! a stale ID fails locally instead of confusing the renderer.

use std::collections::HashSet;

use easel_protocol::WindowId;

use crate::error::{Error, Result};

#[derive(Debug, Default)]
pub struct WindowRegistry {
    open: HashSet<WindowId>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: WindowId) {
        self.open.insert(id);
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.open.contains(&id)
    }

    /// Remove one window. Returns whether it was present.
    pub fn forget(&mut self, id: WindowId) -> bool {
        self.open.remove(&id)
    }

    /// Fail with [`Error::UnknownWindow`] when the ID is not open.
    pub fn verify(&self, id: WindowId) -> Result<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(Error::UnknownWindow(id))
        }
    }

    /// Invalidate every window at once. Renderer death takes this path.
    pub fn clear(&mut self) {
        self.open.clear();
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
