// Wires a fully in-process TaskManager: in-memory stores, the five builtin
// agents bound to mock external capabilities, and the builtin workflows.
// Used by `run` for a one-shot local execution and by `serve` as the
// default backend when no durable store is requested.

use std::sync::Arc;

use tokio::sync::RwLock;

use a2a_agents::{
    BookmarkStore, CategorizationAgent, EmbeddingAgent, EnrichmentAgent, ImportAgent,
    InMemoryBookmarkStore, MockAiClient, MockEmbeddingClient, MockUrlFetcher, ValidationAgent,
};
use a2a_core::{Agent, AgentRegistry, WorkflowRegistry};
use a2a_runtime::{ProgressHub, TaskManager};
use a2a_store::{ArtifactStore, InMemoryArtifactStore, InMemoryMessageLog, InMemoryTaskStore, MessageLog, TaskStore};

/// Everything a command needs to submit and drive tasks through.
pub struct LocalRuntime {
    pub manager: Arc<TaskManager>,
    pub progress: Arc<ProgressHub>,
    pub agents: Arc<RwLock<AgentRegistry>>,
    pub workflows: Arc<RwLock<WorkflowRegistry>>,
}

/// Builds a runtime over the given store trio, registering the five builtin
/// agents against an in-memory bookmark store and mock external clients.
/// Swapping in `http-fetcher`'s `ReqwestUrlFetcher` or a real AI/embedding
/// client is a matter of changing this one function.
pub fn build(tasks: Arc<dyn TaskStore>, artifacts: Arc<dyn ArtifactStore>, messages: Arc<dyn MessageLog>) -> LocalRuntime {
    let bookmarks: Arc<dyn BookmarkStore> = Arc::new(InMemoryBookmarkStore::new());

    let mut agent_registry = AgentRegistry::new();
    bind(&mut agent_registry, ImportAgent::new(bookmarks.clone()));
    bind(&mut agent_registry, ValidationAgent::new(bookmarks.clone(), Arc::new(MockUrlFetcher)));
    bind(&mut agent_registry, EnrichmentAgent::new(bookmarks.clone(), Arc::new(MockAiClient)));
    bind(&mut agent_registry, CategorizationAgent::new(bookmarks.clone()));
    bind(&mut agent_registry, EmbeddingAgent::new(bookmarks, Arc::new(MockEmbeddingClient)));

    let agents = Arc::new(RwLock::new(agent_registry));
    let workflows = Arc::new(RwLock::new(WorkflowRegistry::with_builtins()));
    let progress = Arc::new(ProgressHub::new());

    let manager = Arc::new(TaskManager::new(tasks, artifacts, messages, agents.clone(), workflows.clone(), progress.clone()));

    LocalRuntime { manager, progress, agents, workflows }
}

/// Fully ephemeral runtime: every store is in-memory and discarded when the
/// process exits. What `run` uses, and `serve`'s default when `--data-dir`
/// is not given.
pub fn build_in_memory() -> LocalRuntime {
    build(Arc::new(InMemoryTaskStore::new()), Arc::new(InMemoryArtifactStore::new()), Arc::new(InMemoryMessageLog::new()))
}

fn bind<A: Agent + 'static>(registry: &mut AgentRegistry, agent: A) {
    let card = agent.capabilities().clone();
    registry.bind_handle(card, Arc::new(agent));
}
