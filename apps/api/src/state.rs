use crate::config::Config;
use crate::resources::ResourceStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Explicitly constructed at startup; owns the catalog and blob store handles.
    pub store: ResourceStore,
    pub config: Config,
}
