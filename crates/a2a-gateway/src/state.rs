// Shared application state handed to every handler via axum's `State`
// extractor. Cloning `AppState` only clones `Arc`s; the underlying registries
// and stores are shared process-wide.

use std::sync::Arc;

use tokio::sync::RwLock;

use a2a_core::{AgentRegistry, WorkflowRegistry};
use a2a_runtime::{ProgressHub, TaskManager};

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<TaskManager>,
    pub progress: Arc<ProgressHub>,
    pub agents: Arc<RwLock<AgentRegistry>>,
    pub workflows: Arc<RwLock<WorkflowRegistry>>,
}

impl AppState {
    pub fn new(
        manager: Arc<TaskManager>,
        progress: Arc<ProgressHub>,
        agents: Arc<RwLock<AgentRegistry>>,
        workflows: Arc<RwLock<WorkflowRegistry>>,
    ) -> Self {
        Self { manager, progress, agents, workflows }
    }
}
