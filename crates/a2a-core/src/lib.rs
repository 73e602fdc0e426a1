// a2a-core - foundation types and traits for the A2A workflow runtime.
//
// Domain types (Task, Artifact, Message, AgentCapabilityCard) plus the base
// Agent contract and the registries that hold live agents and workflow
// definitions. Pluggable persistence backends live in `a2a-store`; the
// dispatcher and worker pools live in `a2a-runtime`.

pub mod agent;
pub mod artifact;
pub mod error;
pub mod message;
pub mod registry;
pub mod task;
pub mod workflow;

pub use agent::{
    Agent, AgentCapabilityCard, AgentContext, AgentHandle, AgentOutcome, CapabilityStatus,
    FieldSpec, OutputSpec,
};
pub use artifact::{artifact_types, Artifact};
pub use error::{Error, Result};
pub use message::{Message, MessageType};
pub use registry::{AgentRegistry, Registry, WorkflowRegistry};
pub use task::{Task, TaskStatus};
pub use workflow::{builtin_workflows, WorkflowDefinition};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fixed dimensionality of every embedding vector the Embedding agent produces.
/// Declared, not measured — this is the constant even when zero bookmarks are
/// processed in a given run.
pub const EMBEDDING_VECTOR_DIMENSIONS: usize = 1536;

/// Default default-taxonomy category names seeded on first Categorization use.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Development",
    "AI/ML",
    "Technology",
    "Business",
    "Education",
    "News",
    "Entertainment",
    "Reference",
    "Tools",
    "Personal",
    "Other",
];
