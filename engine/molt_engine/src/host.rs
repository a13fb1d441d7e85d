//! Host integration seam.
//!
//! The engine never talks to a loader, a file watcher, or a UI. When it
//! needs something only the embedding host can do (currently: a full
//! reload of a module whose new shape cannot be patched in place), it asks
//! through [`ReloadHost`].

use parking_lot::Mutex;

use crate::module::ModuleId;

/// What the engine asks of its embedding host.
pub trait ReloadHost {
    /// A superseded version of `module` (at `generation`) holds exports
    /// the replacement no longer provides. Patching stopped; the host
    /// should arrange a full reload of everything that imported it.
    fn request_invalidate(&self, module: ModuleId, generation: u32);
}

/// Host that drops every request on the floor.
#[derive(Default, Debug, Clone, Copy)]
pub struct NullReloadHost;

impl ReloadHost for NullReloadHost {
    fn request_invalidate(&self, module: ModuleId, generation: u32) {
        tracing::debug!(?module, generation, "no host attached, dropping invalidation request");
    }
}

/// Host that records every request for later inspection.
#[derive(Default, Debug)]
pub struct RecordingReloadHost {
    requests: Mutex<Vec<(ModuleId, u32)>>,
}

impl RecordingReloadHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything recorded so far.
    pub fn take_requests(&self) -> Vec<(ModuleId, u32)> {
        std::mem::take(&mut *self.requests.lock())
    }
}

impl ReloadHost for RecordingReloadHost {
    fn request_invalidate(&self, module: ModuleId, generation: u32) {
        self.requests.lock().push((module, generation));
    }
}
