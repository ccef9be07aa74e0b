//! The manager and backends a frame is bound to.

use std::sync::{Arc, OnceLock};

use crate::manager::{global_manager, MemoryManager};
use crate::source::Backends;

static DEFAULT_BACKENDS: OnceLock<Arc<Backends>> = OnceLock::new();

/// Dependencies injected into every frame at construction.
///
/// Tests build a context around their own [`MemoryManager`] for isolation;
/// everyone else can use [`FrameContext::global`].
#[derive(Clone, Debug)]
pub struct FrameContext {
    manager: Arc<MemoryManager>,
    backends: Arc<Backends>,
}

impl FrameContext {
    pub fn new(manager: Arc<MemoryManager>, backends: Arc<Backends>) -> Self {
        Self { manager, backends }
    }

    /// Context bound to `manager` with the default backends.
    pub fn with_manager(manager: Arc<MemoryManager>) -> Self {
        Self::new(manager, default_backends())
    }

    /// The process-wide manager and default backends.
    pub fn global() -> Self {
        Self::new(global_manager(), default_backends())
    }

    #[inline]
    pub fn manager(&self) -> &Arc<MemoryManager> {
        &self.manager
    }

    #[inline]
    pub fn backends(&self) -> &Arc<Backends> {
        &self.backends
    }
}

fn default_backends() -> Arc<Backends> {
    DEFAULT_BACKENDS
        .get_or_init(|| Arc::new(Backends::default()))
        .clone()
}
