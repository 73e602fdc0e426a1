// Task - the persistent workflow instance the whole runtime revolves around.
//
// A Task pins a workflow definition (an ordered sequence of agent types) to a
// user and walks it one stage at a time. `status`/`current_step` are the only
// authoritative progress signal; the Message Log is a derived view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Lifecycle state of a task. Transitions form a DAG, never a cycle:
/// pending -> running -> {completed, failed, cancelled}, running -> cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    /// Whether `self -> to` is a permitted transition per the task state machine.
    pub fn can_transition_to(self, to: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, to),
            (Pending, Running)
                | (Running, Running)
                | (Running, Completed)
                | (Running, Failed)
                | (Pending, Cancelled)
                | (Running, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    /// Root task kind, usually mirrors the workflow type.
    #[serde(rename = "type")]
    pub task_type: String,
    pub status: TaskStatus,
    pub workflow_type: String,
    /// Ordered agent types this task's workflow dispatches through.
    pub workflow_agents: Vec<String>,
    pub current_agent: Option<String>,
    pub current_step: usize,
    pub total_steps: usize,
    /// Accumulated inputs/outputs merged in by completed stages.
    pub context: Map<String, Value>,
    pub metadata: Map<String, Value>,
    pub user_id: String,
    pub error_message: Option<String>,
    pub cancellation_requested: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Task {
    pub fn new(
        task_type: impl Into<String>,
        workflow_type: impl Into<String>,
        workflow_agents: Vec<String>,
        user_id: impl Into<String>,
        context: Map<String, Value>,
        metadata: Map<String, Value>,
    ) -> Self {
        let now = Utc::now();
        let total_steps = workflow_agents.len();
        Self {
            id: Uuid::new_v4().to_string(),
            task_type: task_type.into(),
            status: TaskStatus::Pending,
            workflow_type: workflow_type.into(),
            workflow_agents,
            current_agent: None,
            current_step: 0,
            total_steps,
            context,
            metadata,
            user_id: user_id.into(),
            error_message: None,
            cancellation_requested: false,
            created: now,
            updated: now,
        }
    }

    /// The agent type due to run next, or `None` if the workflow is exhausted.
    pub fn next_agent(&self) -> Option<&str> {
        self.workflow_agents.get(self.current_step).map(|s| s.as_str())
    }

    pub fn is_exhausted(&self) -> bool {
        self.current_step >= self.total_steps
    }

    /// Progress in the 0-100 range, derived from step count — a coarse signal;
    /// fine-grained in-stage progress comes from Messages, not this field.
    pub fn progress_percent(&self) -> u8 {
        if self.total_steps == 0 {
            return 100;
        }
        let pct = (self.current_step as f64 / self.total_steps as f64) * 100.0;
        pct.min(100.0) as u8
    }

    pub fn merge_context(&mut self, partial: Map<String, Value>) {
        for (k, v) in partial {
            self.context.insert(k, v);
        }
        self.updated = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        Task::new(
            "bookmark_workflow",
            "full_import",
            vec!["import".into(), "validation".into()],
            "user-1",
            Map::new(),
            Map::new(),
        )
    }

    #[test]
    fn new_task_starts_pending_at_step_zero() {
        let task = sample_task();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.current_step, 0);
        assert_eq!(task.total_steps, 2);
        assert_eq!(task.next_agent(), Some("import"));
    }

    #[test]
    fn state_machine_rejects_illegal_transitions() {
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Running));
        assert!(!TaskStatus::Pending.can_transition_to(TaskStatus::Completed));
        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Running));
        assert!(TaskStatus::Running.can_transition_to(TaskStatus::Cancelled));
    }

    #[test]
    fn progress_percent_scales_with_steps() {
        let mut task = sample_task();
        assert_eq!(task.progress_percent(), 0);
        task.current_step = 1;
        assert_eq!(task.progress_percent(), 50);
        task.current_step = 2;
        assert_eq!(task.progress_percent(), 100);
        assert!(task.is_exhausted());
    }

    #[test]
    fn zero_stage_workflow_is_immediately_complete() {
        let task = Task::new("noop", "empty", vec![], "user-1", Map::new(), Map::new());
        assert_eq!(task.progress_percent(), 100);
        assert!(task.is_exhausted());
        assert_eq!(task.next_agent(), None);
    }
}
