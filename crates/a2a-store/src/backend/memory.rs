// In-memory backends: lock-free concurrent maps via DashMap, the default
// store used by the CLI's `run` command and by every in-process test.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use a2a_core::{Artifact, Error, Message, Result, Task, TaskStatus};

use crate::traits::{conflict, ArtifactStore, MessageLog, TaskFilter, TaskStore};

#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: DashMap<String, Task>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(&self, task: Task) -> Result<Task> {
        if self.tasks.contains_key(&task.id) {
            return Err(Error::AlreadyExists(format!("task '{}'", task.id)));
        }
        self.tasks.insert(task.id.clone(), task.clone());
        Ok(task)
    }

    async fn transition(
        &self,
        task_id: &str,
        expected_status: TaskStatus,
        apply: Box<dyn FnOnce(&mut Task) + Send>,
    ) -> Result<Task> {
        let mut entry = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| Error::not_found(format!("task '{task_id}'")))?;

        if entry.status != expected_status {
            return Err(conflict(task_id, expected_status, entry.status));
        }
        apply(&mut entry);
        entry.updated = chrono::Utc::now();
        Ok(entry.clone())
    }

    async fn load(&self, task_id: &str) -> Result<Task> {
        self.tasks
            .get(task_id)
            .map(|t| t.clone())
            .ok_or_else(|| Error::not_found(format!("task '{task_id}'")))
    }

    async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .tasks
            .iter()
            .map(|e| e.value().clone())
            .filter(|t| filter.status.map_or(true, |s| t.status == s))
            .filter(|t| filter.workflow_type.as_deref().map_or(true, |w| t.workflow_type == w))
            .filter(|t| filter.user_id.as_deref().map_or(true, |u| t.user_id == u))
            .filter(|t| filter.created_after.map_or(true, |ts| t.created > ts))
            .filter(|t| filter.created_before.map_or(true, |ts| t.created < ts))
            .collect();
        tasks.sort_by_key(|t| t.created);
        Ok(tasks)
    }
}

#[derive(Default)]
pub struct InMemoryArtifactStore {
    artifacts: DashMap<String, Vec<Artifact>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn put(&self, artifact: Artifact) -> Result<Artifact> {
        let mut entry = self.artifacts.entry(artifact.task_id.clone()).or_default();
        if entry
            .iter()
            .any(|a| a.agent_type == artifact.agent_type && a.artifact_type == artifact.artifact_type)
        {
            return Err(Error::AlreadyExists(format!(
                "artifact for task '{}' agent '{}' type '{}'",
                artifact.task_id, artifact.agent_type, artifact.artifact_type
            )));
        }
        entry.push(artifact.clone());
        Ok(artifact)
    }

    async fn get(&self, task_id: &str, agent_type: Option<&str>, artifact_type: Option<&str>) -> Result<Vec<Artifact>> {
        let results = self
            .artifacts
            .get(task_id)
            .map(|entry| {
                entry
                    .iter()
                    .filter(|a| agent_type.map_or(true, |t| a.agent_type == t))
                    .filter(|a| artifact_type.map_or(true, |t| a.artifact_type == t))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(results)
    }
}

#[derive(Default)]
pub struct InMemoryMessageLog {
    messages: DashMap<String, Vec<Message>>,
}

impl InMemoryMessageLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageLog for InMemoryMessageLog {
    async fn append(&self, message: Message) -> Result<()> {
        self.messages.entry(message.task_id.clone()).or_default().push(message);
        Ok(())
    }

    async fn tail(&self, task_id: &str, since: Option<chrono::DateTime<chrono::Utc>>) -> Result<Vec<Message>> {
        let messages = self
            .messages
            .get(task_id)
            .map(|entry| {
                entry
                    .iter()
                    .filter(|m| since.map_or(true, |ts| m.timestamp > ts))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use a2a_core::artifact_types;
    use serde_json::{json, Map};

    fn sample_task() -> Task {
        Task::new("wf", "full_import", vec!["import".into()], "u1", Map::new(), Map::new())
    }

    #[tokio::test]
    async fn create_rejects_duplicate_id() {
        let store = InMemoryTaskStore::new();
        let task = sample_task();
        store.create(task.clone()).await.unwrap();
        assert!(matches!(store.create(task).await, Err(Error::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn transition_is_compare_and_set() {
        let store = InMemoryTaskStore::new();
        let task = store.create(sample_task()).await.unwrap();

        let updated = store
            .transition(&task.id, TaskStatus::Pending, Box::new(|t| t.status = TaskStatus::Running))
            .await
            .unwrap();
        assert_eq!(updated.status, TaskStatus::Running);

        let conflict_err = store
            .transition(&task.id, TaskStatus::Pending, Box::new(|t| t.status = TaskStatus::Completed))
            .await;
        assert!(matches!(conflict_err, Err(Error::Conflict { .. })));
    }

    #[tokio::test]
    async fn artifact_put_is_idempotency_keyed() {
        let store = InMemoryArtifactStore::new();
        let artifact = Artifact::new("t1", "import", artifact_types::IMPORT_RESULT, json!({"insertedCount": 1}));
        store.put(artifact.clone()).await.unwrap();
        assert!(matches!(store.put(artifact).await, Err(Error::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn message_tail_filters_by_since() {
        let log = InMemoryMessageLog::new();
        let first = Message::progress("t1", "import", 10, 1, 10);
        log.append(first.clone()).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = Message::progress("t1", "import", 20, 2, 10);
        log.append(second.clone()).await.unwrap();

        let all = log.tail("t1", None).await.unwrap();
        assert_eq!(all.len(), 2);

        let since_first = log.tail("t1", Some(first.timestamp)).await.unwrap();
        assert_eq!(since_first.len(), 1);
        assert_eq!(since_first[0].id, second.id);
    }
}
