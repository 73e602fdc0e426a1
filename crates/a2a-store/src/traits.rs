// Pluggable persistence contracts for the Task Store, Artifact Store, and
// Message Log (components C1-C3). Backends implement these traits; the
// dispatcher in `a2a-runtime` depends only on the traits.

use async_trait::async_trait;
use a2a_core::{Artifact, Error, Message, Result, Task, TaskStatus};

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub workflow_type: Option<String>,
    pub user_id: Option<String>,
    pub created_after: Option<chrono::DateTime<chrono::Utc>>,
    pub created_before: Option<chrono::DateTime<chrono::Utc>>,
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create(&self, task: Task) -> Result<Task>;

    /// Compare-and-set transition: succeeds only if the stored task's status
    /// equals `expected_status`; otherwise returns `Error::Conflict`.
    async fn transition(
        &self,
        task_id: &str,
        expected_status: TaskStatus,
        apply: Box<dyn FnOnce(&mut Task) + Send>,
    ) -> Result<Task>;

    async fn load(&self, task_id: &str) -> Result<Task>;
    async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>>;
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Rejects with `Error::AlreadyExists` if `(task_id, agent_type, type)` is taken.
    async fn put(&self, artifact: Artifact) -> Result<Artifact>;

    async fn get(&self, task_id: &str, agent_type: Option<&str>, artifact_type: Option<&str>) -> Result<Vec<Artifact>>;
}

#[async_trait]
pub trait MessageLog: Send + Sync {
    /// Best-effort: failures are logged by the caller, never escalated to a task failure.
    async fn append(&self, message: Message) -> Result<()>;

    async fn tail(&self, task_id: &str, since: Option<chrono::DateTime<chrono::Utc>>) -> Result<Vec<Message>>;
}

pub(crate) fn conflict(task_id: &str, expected: TaskStatus, actual: TaskStatus) -> Error {
    Error::conflict(format!("task:{task_id}"), format!("expected status {expected:?}, found {actual:?}"))
}
