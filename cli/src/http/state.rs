use std::sync::Arc;

use indexer_core::api::{Monitor, Registry, RunContext};

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub monitor: Arc<Monitor>,
    pub registry: Registry,
    /// Parent of every per-request context; cancelled on shutdown.
    pub ctx: RunContext,
}

impl AppState {
    pub fn new(monitor: Arc<Monitor>, registry: Registry, ctx: RunContext) -> Self {
        Self {
            monitor,
            registry,
            ctx,
        }
    }
}
