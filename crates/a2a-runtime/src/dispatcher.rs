// Task Manager (C7): resolves a workflow into an ordered agent sequence and
// walks a task across it one stage at a time, persisting every transition
// before the next stage is invoked so a process restart resumes cleanly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{error, instrument, warn};

use a2a_core::{
    AgentContext, AgentOutcome, AgentRegistry, Artifact, Error, Message, MessageType, Registry,
    Result, Task, TaskStatus, WorkflowRegistry,
};
use a2a_store::{ArtifactStore, MessageLog, TaskFilter, TaskStore};

use crate::progress::{ProgressEvent, ProgressHub};

#[derive(Debug, Clone)]
pub enum DispatchEvent {
    Submitted { task_id: String },
    StageCompleted { task_id: String, agent_type: String, step: usize },
    StageFailed { task_id: String, agent_type: String, error: String },
    Completed { task_id: String },
    Cancelled { task_id: String },
}

/// Dispatches tasks across their workflow's agent pipeline. Holds no agent
/// state itself; agent instances are looked up from the registry fresh on
/// every stage so a rebind (e.g. a restarted agent) takes effect immediately.
pub struct TaskManager {
    tasks: Arc<dyn TaskStore>,
    artifacts: Arc<dyn ArtifactStore>,
    messages: Arc<dyn MessageLog>,
    agents: Arc<RwLock<AgentRegistry>>,
    workflows: Arc<RwLock<WorkflowRegistry>>,
    progress: Arc<ProgressHub>,
    cancel_flags: dashmap::DashMap<String, Arc<AtomicBool>>,
    events: Option<tokio::sync::mpsc::Sender<DispatchEvent>>,
}

impl TaskManager {
    pub fn new(
        tasks: Arc<dyn TaskStore>,
        artifacts: Arc<dyn ArtifactStore>,
        messages: Arc<dyn MessageLog>,
        agents: Arc<RwLock<AgentRegistry>>,
        workflows: Arc<RwLock<WorkflowRegistry>>,
        progress: Arc<ProgressHub>,
    ) -> Self {
        Self {
            tasks,
            artifacts,
            messages,
            agents,
            workflows,
            progress,
            cancel_flags: dashmap::DashMap::new(),
            events: None,
        }
    }

    pub fn with_event_channel(mut self, tx: tokio::sync::mpsc::Sender<DispatchEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    async fn emit(&self, event: DispatchEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event).await;
        }
    }

    fn cancel_flag(&self, task_id: &str) -> Arc<AtomicBool> {
        self.cancel_flags.entry(task_id.to_string()).or_insert_with(|| Arc::new(AtomicBool::new(false))).clone()
    }

    /// Resolves `workflow_type`'s agent sequence, creates the root task in
    /// `pending`, and spawns the stage-by-stage run. Returns immediately with
    /// the task id; the workflow advances in the background.
    #[instrument(skip(self, context, metadata))]
    pub async fn submit(
        &self,
        workflow_type: &str,
        context: Map<String, Value>,
        metadata: Map<String, Value>,
        user_id: &str,
    ) -> Result<String>
    where
        Self: 'static,
    {
        let agents = {
            let workflows = self.workflows.read().await;
            let definition = workflows
                .get(workflow_type)
                .ok_or_else(|| Error::not_found(format!("workflow '{workflow_type}'")))?;
            definition.agents.clone()
        };

        let task = Task::new("bookmark_workflow", workflow_type, agents, user_id, context, metadata);
        let task = self.tasks.create(task).await?;
        let task_id = task.id.clone();

        self.progress.publish(&task_id, ProgressEvent::Snapshot(task));
        self.emit(DispatchEvent::Submitted { task_id: task_id.clone() }).await;

        Ok(task_id)
    }

    /// Runs every remaining stage of `task_id` to completion (or failure or
    /// cancellation), one `dispatch_next` call at a time. Callers that want
    /// fire-and-forget execution should `tokio::spawn` this.
    pub async fn run_to_completion(self: &Arc<Self>, task_id: &str) {
        loop {
            match self.dispatch_next(task_id).await {
                Ok(task) if task.status.is_terminal() => break,
                Ok(_) => continue,
                Err(err) => {
                    error!(task_id, error = %err, "dispatch_next failed outside the task's own error channel");
                    break;
                }
            }
        }
    }

    /// Runs exactly one stage: transitions `pending|running -> running`,
    /// invokes the due agent's `process`, persists its artifact, advances
    /// `current_step`, and either leaves the task `running` (more stages) or
    /// transitions it to a terminal state.
    #[instrument(skip(self))]
    pub async fn dispatch_next(&self, task_id: &str) -> Result<Task> {
        let task = self.tasks.load(task_id).await?;

        if task.status.is_terminal() {
            return Ok(task);
        }

        let cancel_flag = self.cancel_flag(task_id);
        if task.cancellation_requested || cancel_flag.load(Ordering::SeqCst) {
            return self.finish_cancelled(task_id).await;
        }

        let expected = task.status;
        let Some(agent_type) = task.next_agent().map(str::to_string) else {
            return self.finish_completed(task_id, expected).await;
        };

        let handle = {
            let registry = self.agents.read().await;
            registry.lookup(&agent_type)?
        };

        // Persist the running transition (with current_agent set) before the
        // agent does any work, so a crash mid-stage resumes as "running" with
        // a known current_agent rather than silently stuck at "pending".
        let agent_type_for_apply = agent_type.clone();
        let running_task = self
            .tasks
            .transition(
                task_id,
                expected,
                Box::new(move |t: &mut Task| {
                    t.status = TaskStatus::Running;
                    t.current_agent = Some(agent_type_for_apply);
                }),
            )
            .await?;
        self.progress.publish(task_id, ProgressEvent::Snapshot(running_task.clone()));

        let cancel_flag_for_ctx = Arc::clone(&cancel_flag);
        let messages = Arc::clone(&self.messages);
        let hub = Arc::clone(&self.progress);
        let task_id_owned = task_id.to_string();
        let agent_type_owned = agent_type.clone();

        let progress_cb = move |percent: u8, detail: &str| {
            let messages = Arc::clone(&messages);
            let hub = Arc::clone(&hub);
            let task_id = task_id_owned.clone();
            let agent_type = agent_type_owned.clone();
            let detail = detail.to_string();
            tokio::spawn(async move {
                let message = Message::progress(&task_id, &agent_type, percent, 0, 0).with_metadata(
                    "detail".into(),
                    Value::String(detail),
                );
                let _ = messages.append(message.clone()).await;
                hub.publish(&task_id, ProgressEvent::Update(message));
            });
        };
        let cancelled_cb = move || cancel_flag_for_ctx.load(Ordering::SeqCst);

        let ctx = AgentContext::new(&running_task, progress_cb, cancelled_cb);
        if let Err(err) = handle.validate(&ctx) {
            return self.finish_failed(task_id, TaskStatus::Running, &agent_type, err.to_string()).await;
        }

        let outcome = handle.process(&ctx).await;

        match outcome {
            Ok(AgentOutcome::Completed { artifact_type, data }) => {
                self.finish_stage_success(task_id, &agent_type, artifact_type, data).await
            }
            Ok(AgentOutcome::Failed { error: msg }) => {
                self.finish_failed(task_id, TaskStatus::Running, &agent_type, msg).await
            }
            Err(err) => self.finish_failed(task_id, TaskStatus::Running, &agent_type, err.to_string()).await,
        }
    }

    async fn finish_stage_success(
        &self,
        task_id: &str,
        agent_type: &str,
        artifact_type: String,
        data: Value,
    ) -> Result<Task> {
        let artifact = Artifact::new(task_id, agent_type, &artifact_type, data.clone());
        if let Err(err) = self.artifacts.put(artifact).await {
            // An infra failure persisting the artifact fails the task; the
            // agent's own side effects on shared state are not rolled back.
            return self.finish_failed(task_id, TaskStatus::Running, agent_type, err.to_string()).await;
        }

        // Merge the stage's output fields directly into the task context so
        // the next agent's flat input struct (bookmarkIds/userId/...) picks
        // them up; the artifact store is the place to look up a stage's
        // output by its artifact type, not the context.
        let partial = match data {
            Value::Object(fields) => fields,
            other => {
                let mut wrapped = Map::new();
                wrapped.insert(artifact_type.clone(), other);
                wrapped
            }
        };

        let task = self
            .tasks
            .transition(
                task_id,
                TaskStatus::Running,
                Box::new(move |t: &mut Task| {
                    t.merge_context(partial);
                    t.current_step += 1;
                }),
            )
            .await?;

        self.emit(DispatchEvent::StageCompleted {
            task_id: task_id.to_string(),
            agent_type: agent_type.to_string(),
            step: task.current_step,
        })
        .await;

        if task.is_exhausted() {
            return self.finish_completed(task_id, TaskStatus::Running).await;
        }

        self.progress.publish(task_id, ProgressEvent::Snapshot(task.clone()));
        Ok(task)
    }

    async fn finish_completed(&self, task_id: &str, expected: TaskStatus) -> Result<Task> {
        let task = self
            .tasks
            .transition(task_id, expected, Box::new(|t: &mut Task| {
                t.status = TaskStatus::Completed;
                t.current_agent = None;
            }))
            .await?;
        self.progress.publish(task_id, ProgressEvent::Terminal(task.clone()));
        self.progress.retire(task_id);
        self.cancel_flags.remove(task_id);
        self.emit(DispatchEvent::Completed { task_id: task_id.to_string() }).await;
        Ok(task)
    }

    async fn finish_failed(&self, task_id: &str, expected: TaskStatus, agent_type: &str, message: String) -> Result<Task> {
        let message_for_apply = message.clone();
        let task = self
            .tasks
            .transition(
                task_id,
                expected,
                Box::new(move |t: &mut Task| {
                    t.status = TaskStatus::Failed;
                    t.error_message = Some(message_for_apply);
                }),
            )
            .await?;

        let log_message = Message::new(task_id, agent_type, MessageType::Error, message.clone());
        let _ = self.messages.append(log_message).await;
        warn!(task_id, agent_type, error = %message, "task failed");

        self.progress.publish(task_id, ProgressEvent::Terminal(task.clone()));
        self.progress.retire(task_id);
        self.cancel_flags.remove(task_id);
        self.emit(DispatchEvent::StageFailed {
            task_id: task_id.to_string(),
            agent_type: agent_type.to_string(),
            error: message,
        })
        .await;
        Ok(task)
    }

    async fn finish_cancelled(&self, task_id: &str) -> Result<Task> {
        let current = self.tasks.load(task_id).await?;
        if current.status.is_terminal() {
            return Ok(current);
        }
        let task = self
            .tasks
            .transition(
                task_id,
                current.status,
                Box::new(|t: &mut Task| {
                    t.status = TaskStatus::Cancelled;
                }),
            )
            .await?;
        self.progress.publish(task_id, ProgressEvent::Terminal(task.clone()));
        self.progress.retire(task_id);
        self.cancel_flags.remove(task_id);
        self.emit(DispatchEvent::Cancelled { task_id: task_id.to_string() }).await;
        Ok(task)
    }

    /// Marks cancellation intent. A pending task is cancelled immediately; a
    /// running task's current agent observes the flag at its next progress
    /// checkpoint and must release resources and return promptly.
    pub async fn cancel(&self, task_id: &str) -> Result<()> {
        self.cancel_flag(task_id).store(true, Ordering::SeqCst);
        let task = self.tasks.load(task_id).await?;
        if task.status == TaskStatus::Pending {
            self.finish_cancelled(task_id).await?;
        } else {
            self.tasks
                .transition(
                    task_id,
                    task.status,
                    Box::new(|t: &mut Task| {
                        t.cancellation_requested = true;
                    }),
                )
                .await?;
        }
        Ok(())
    }

    /// Appends a `progress` Message and publishes the corresponding delta;
    /// does not itself alter `Task::status`.
    pub async fn update_progress(&self, task_id: &str, percent: u8, detail: &str) -> Result<()> {
        let task = self.tasks.load(task_id).await?;
        let agent_type = task.current_agent.clone().unwrap_or_default();
        let message = Message::progress(task_id, &agent_type, percent, 0, 0).with_metadata(
            "detail".into(),
            Value::String(detail.to_string()),
        );
        self.messages.append(message.clone()).await?;
        self.progress.publish(task_id, ProgressEvent::Update(message));
        Ok(())
    }

    /// From a failed task, clears the failure and resumes from the last
    /// successful stage, reusing its accumulated context (including prior
    /// stages' artifact data) as input to the next stage.
    pub async fn replay(&self, task_id: &str) -> Result<Task> {
        let task = self
            .tasks
            .transition(
                task_id,
                TaskStatus::Failed,
                Box::new(|t: &mut Task| {
                    t.status = TaskStatus::Pending;
                    t.error_message = None;
                    t.cancellation_requested = false;
                }),
            )
            .await?;
        self.cancel_flag(task_id).store(false, Ordering::SeqCst);
        self.progress.publish(task_id, ProgressEvent::Snapshot(task.clone()));
        Ok(task)
    }

    pub async fn get_task(&self, task_id: &str) -> Result<Task> {
        self.tasks.load(task_id).await
    }

    pub async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        self.tasks.list(filter).await
    }

    pub async fn get_artifacts(&self, task_id: &str, agent_type: Option<&str>, artifact_type: Option<&str>) -> Result<Vec<Artifact>> {
        self.artifacts.get(task_id, agent_type, artifact_type).await
    }

    pub async fn get_messages(&self, task_id: &str, since: Option<chrono::DateTime<chrono::Utc>>) -> Result<Vec<Message>> {
        self.messages.tail(task_id, since).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use a2a_core::{
        Agent, AgentCapabilityCard, AgentHandle, Error as CoreError, Registry as _,
    };
    use a2a_store::{InMemoryArtifactStore, InMemoryMessageLog, InMemoryTaskStore};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio_stream::StreamExt;

    struct EchoAgent {
        card: AgentCapabilityCard,
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Agent for EchoAgent {
        fn capabilities(&self) -> &AgentCapabilityCard {
            &self.card
        }
        fn validate(&self, _ctx: &AgentContext<'_>) -> Result<()> {
            Ok(())
        }
        async fn process(&self, ctx: &AgentContext<'_>) -> Result<AgentOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ctx.report_progress(50, "halfway");
            if self.fail {
                return Ok(AgentOutcome::Failed { error: "boom".into() });
            }
            let mut data = Map::new();
            data.insert(format!("{}Ok", self.card.agent_type), Value::Bool(true));
            Ok(AgentOutcome::Completed { artifact_type: self.card.outputs.artifact_type.clone(), data: Value::Object(data) })
        }
    }

    fn make_manager() -> (Arc<TaskManager>, Arc<InMemoryTaskStore>) {
        let tasks = Arc::new(InMemoryTaskStore::new());
        let artifacts = Arc::new(InMemoryArtifactStore::new());
        let messages = Arc::new(InMemoryMessageLog::new());

        let mut agent_registry = AgentRegistry::new();
        let import_card = AgentCapabilityCard::builder("import", "bookmark_import_result").build();
        let import_handle: AgentHandle =
            Arc::new(EchoAgent { card: import_card.clone(), calls: AtomicUsize::new(0), fail: false });
        agent_registry.bind_handle(import_card, import_handle);

        let validation_card = AgentCapabilityCard::builder("validation", "bookmark_validation_result").build();
        let validation_handle: AgentHandle =
            Arc::new(EchoAgent { card: validation_card.clone(), calls: AtomicUsize::new(0), fail: false });
        agent_registry.bind_handle(validation_card, validation_handle);

        let mut workflow_registry = WorkflowRegistry::new();
        workflow_registry.register(a2a_core::WorkflowDefinition::new("quick_import", vec!["import", "validation"])).unwrap();

        let manager = TaskManager::new(
            tasks.clone(),
            artifacts,
            messages,
            Arc::new(RwLock::new(agent_registry)),
            Arc::new(RwLock::new(workflow_registry)),
            Arc::new(ProgressHub::new()),
        );
        (Arc::new(manager), tasks)
    }

    #[tokio::test]
    async fn submit_and_run_to_completion_walks_every_stage() {
        let (manager, _tasks) = make_manager();
        let task_id = manager.submit("quick_import", Map::new(), Map::new(), "user-1").await.unwrap();
        manager.run_to_completion(&task_id).await;

        let task = manager.get_task(&task_id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.current_step, 2);
        assert!(task.context.contains_key("importOk"));
        assert!(task.context.contains_key("validationOk"));
    }

    #[tokio::test]
    async fn failed_stage_fails_the_task_and_stops_the_pipeline() {
        let tasks = Arc::new(InMemoryTaskStore::new());
        let artifacts = Arc::new(InMemoryArtifactStore::new());
        let messages = Arc::new(InMemoryMessageLog::new());

        let mut agent_registry = AgentRegistry::new();
        let import_card = AgentCapabilityCard::builder("import", "bookmark_import_result").build();
        let import_handle: AgentHandle =
            Arc::new(EchoAgent { card: import_card.clone(), calls: AtomicUsize::new(0), fail: true });
        agent_registry.bind_handle(import_card, import_handle);

        let mut workflow_registry = WorkflowRegistry::new();
        workflow_registry.register(a2a_core::WorkflowDefinition::new("import_only", vec!["import"])).unwrap();

        let manager = Arc::new(TaskManager::new(
            tasks,
            artifacts,
            messages,
            Arc::new(RwLock::new(agent_registry)),
            Arc::new(RwLock::new(workflow_registry)),
            Arc::new(ProgressHub::new()),
        ));

        let task_id = manager.submit("import_only", Map::new(), Map::new(), "user-1").await.unwrap();
        manager.run_to_completion(&task_id).await;

        let task = manager.get_task(&task_id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error_message.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn cancel_on_pending_task_transitions_immediately() {
        let (manager, _tasks) = make_manager();
        let task_id = manager.submit("quick_import", Map::new(), Map::new(), "user-1").await.unwrap();
        manager.cancel(&task_id).await.unwrap();

        let task = manager.get_task(&task_id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Cancelled);
    }

    #[tokio::test]
    async fn submit_rejects_unknown_workflow() {
        let (manager, _tasks) = make_manager();
        let err = manager.submit("no_such_workflow", Map::new(), Map::new(), "user-1").await;
        assert!(matches!(err, Err(CoreError::NotFound(_))));
    }
}
