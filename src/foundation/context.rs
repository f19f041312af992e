use std::collections::HashMap;
use std::sync::Arc;

use crate::foundation::config::RuntimeConfig;
use crate::render::renderer::{RenderCaps, Renderer};
use crate::render::surface::{ImageId, ImageSurface};

/// Process-wide runtime state, owned by a [`crate::Scene`] instead of living in globals.
///
/// Holds the configuration, the backend capability flags decided at renderer init, the shared
/// image cache, and the queue of node-owned renderer resources waiting to be released.
#[derive(Debug, Default)]
pub struct Runtime {
    config: RuntimeConfig,
    caps: RenderCaps,
    images: HashMap<String, Arc<ImageSurface>>,
    pending_release: Vec<ImageId>,
    released_total: u64,
}

impl Runtime {
    /// Create a runtime with the given configuration.
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Backend capabilities recorded by [`Runtime::attach_renderer`].
    pub fn caps(&self) -> RenderCaps {
        self.caps
    }

    /// Record the capability flags of the renderer that will draw this runtime's scene.
    pub fn attach_renderer(&mut self, renderer: &dyn Renderer) {
        self.caps = renderer.caps();
    }

    /// Register a decoded image under `key`, replacing any previous entry.
    pub fn register_image(&mut self, key: impl Into<String>, image: Arc<ImageSurface>) {
        self.images.insert(key.into(), image);
    }

    /// Look up a registered image.
    pub fn image(&self, key: &str) -> Option<Arc<ImageSurface>> {
        self.images.get(key).cloned()
    }

    pub(crate) fn queue_release(&mut self, id: ImageId) {
        tracing::debug!(image = id.0, "queue renderer cache release");
        self.pending_release.push(id);
    }

    /// Number of releases waiting for the next [`Runtime::drain_releases`].
    pub fn pending_releases(&self) -> usize {
        self.pending_release.len()
    }

    /// Total number of releases forwarded to renderers since creation or the last reset.
    pub fn released_total(&self) -> u64 {
        self.released_total
    }

    /// Forward queued releases to `renderer.uncache`. Returns how many were released.
    pub fn drain_releases(&mut self, renderer: &mut dyn Renderer) -> usize {
        let n = self.pending_release.len();
        for id in self.pending_release.drain(..) {
            renderer.uncache(id);
        }
        self.released_total += n as u64;
        n
    }

    /// Drop cached images, pending releases and capability flags; keep the configuration.
    pub fn reset(&mut self) {
        self.caps = RenderCaps::default();
        self.images.clear();
        self.pending_release.clear();
        self.released_total = 0;
    }
}
