// Durable Task Store backed by sled, following the same persist-on-write
// discipline as this codebase's file-based memory backend, but keyed by
// task id in an embedded on-disk tree instead of a single JSON file.

use async_trait::async_trait;
use std::path::Path;
use tokio::sync::RwLock;

use a2a_core::{Error, Result, Task, TaskStatus};

use crate::traits::{conflict, TaskFilter, TaskStore};

pub struct SledTaskStore {
    db: ::sled::Db,
    // sled itself is internally synchronized; the lock here only serializes
    // the read-modify-write sequence a compare-and-set transition needs.
    transition_lock: RwLock<()>,
}

impl SledTaskStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = ::sled::open(path).map_err(|e| Error::internal(format!("failed to open sled db: {e}")))?;
        Ok(Self { db, transition_lock: RwLock::new(()) })
    }

    fn read_task(&self, task_id: &str) -> Result<Task> {
        let bytes = self
            .db
            .get(task_id.as_bytes())
            .map_err(|e| Error::internal(format!("sled read error: {e}")))?
            .ok_or_else(|| Error::not_found(format!("task '{task_id}'")))?;
        serde_json::from_slice(&bytes).map_err(Error::from)
    }

    fn write_task(&self, task: &Task) -> Result<()> {
        let bytes = serde_json::to_vec(task)?;
        self.db
            .insert(task.id.as_bytes(), bytes)
            .map_err(|e| Error::internal(format!("sled write error: {e}")))?;
        self.db.flush().map_err(|e| Error::internal(format!("sled flush error: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl TaskStore for SledTaskStore {
    async fn create(&self, task: Task) -> Result<Task> {
        if self.db.contains_key(task.id.as_bytes()).map_err(|e| Error::internal(e.to_string()))? {
            return Err(Error::AlreadyExists(format!("task '{}'", task.id)));
        }
        self.write_task(&task)?;
        Ok(task)
    }

    async fn transition(
        &self,
        task_id: &str,
        expected_status: TaskStatus,
        apply: Box<dyn FnOnce(&mut Task) + Send>,
    ) -> Result<Task> {
        let _guard = self.transition_lock.write().await;
        let mut task = self.read_task(task_id)?;
        if task.status != expected_status {
            return Err(conflict(task_id, expected_status, task.status));
        }
        apply(&mut task);
        task.updated = chrono::Utc::now();
        self.write_task(&task)?;
        Ok(task)
    }

    async fn load(&self, task_id: &str) -> Result<Task> {
        self.read_task(task_id)
    }

    async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let mut tasks = Vec::new();
        for entry in self.db.iter() {
            let (_, bytes) = entry.map_err(|e| Error::internal(format!("sled scan error: {e}")))?;
            let task: Task = serde_json::from_slice(&bytes)?;
            if filter.status.map_or(true, |s| task.status == s)
                && filter.workflow_type.as_deref().map_or(true, |w| task.workflow_type == w)
                && filter.user_id.as_deref().map_or(true, |u| task.user_id == u)
                && filter.created_after.map_or(true, |ts| task.created > ts)
                && filter.created_before.map_or(true, |ts| task.created < ts)
            {
                tasks.push(task);
            }
        }
        tasks.sort_by_key(|t| t.created);
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use tempfile::tempdir;

    fn sample_task() -> Task {
        Task::new("wf", "full_import", vec!["import".into()], "u1", Map::new(), Map::new())
    }

    #[tokio::test]
    async fn round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let store = SledTaskStore::open(dir.path()).unwrap();
        let task = store.create(sample_task()).await.unwrap();
        let loaded = store.load(&task.id).await.unwrap();
        assert_eq!(loaded.id, task.id);
    }

    #[tokio::test]
    async fn transition_rejects_stale_expectation() {
        let dir = tempdir().unwrap();
        let store = SledTaskStore::open(dir.path()).unwrap();
        let task = store.create(sample_task()).await.unwrap();
        store
            .transition(&task.id, TaskStatus::Pending, Box::new(|t| t.status = TaskStatus::Running))
            .await
            .unwrap();

        let err = store
            .transition(&task.id, TaskStatus::Pending, Box::new(|t| t.status = TaskStatus::Completed))
            .await;
        assert!(matches!(err, Err(Error::Conflict { .. })));
    }
}
