//! a2a-store - pluggable persistence backends for the Task Store, Artifact
//! Store, and Message Log.
//!
//! ## Backends
//!
//! - **in-memory** (default): DashMap-backed, ephemeral, used by the CLI's
//!   `run` command and by every test in the workspace.
//! - **sled** (`sled-backend` feature): an embedded on-disk Task Store that
//!   survives process restarts.

pub mod backend;
pub mod traits;

pub use backend::memory::{InMemoryArtifactStore, InMemoryMessageLog, InMemoryTaskStore};
#[cfg(feature = "sled-backend")]
pub use backend::sled::SledTaskStore;
pub use traits::{ArtifactStore, MessageLog, TaskFilter, TaskStore};
