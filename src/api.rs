//! HTTP API for the offer flow

mod handlers;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::runtime::FlowMachine;
use crate::tools::ToolRegistry;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub flow: Arc<FlowMachine>,
    pub tools: Arc<ToolRegistry>,
}

impl AppState {
    pub fn new(flow: Arc<FlowMachine>) -> Self {
        Self {
            flow,
            tools: Arc::new(ToolRegistry::standard()),
        }
    }
}
