use std::sync::Arc;

use weft_core::{AgentDescriptor, TaskStore};
use weft_executor::ProtocolExecutor;

/// Shared application state for axum handlers.
pub struct AppState {
    pub descriptor: AgentDescriptor,
    pub executor: Arc<ProtocolExecutor>,
    pub store: Arc<dyn TaskStore>,
}
