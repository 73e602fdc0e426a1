// Task API (submit / status / list / cancel / replay / artifacts / messages).
// Route shapes follow the wire contract: external callers see camelCase JSON
// regardless of the workspace's snake_case Rust types.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use a2a_core::{Artifact, Message, Task};
use a2a_store::TaskFilter;

use crate::error::{GatewayError, GatewayResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(rename = "workflowType")]
    workflow_type: String,
    #[serde(default)]
    context: Map<String, Value>,
    #[serde(default)]
    metadata: Map<String, Value>,
    #[serde(rename = "userId")]
    user_id: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    #[serde(rename = "taskId")]
    task_id: String,
}

pub async fn submit(State(state): State<AppState>, Json(req): Json<SubmitRequest>) -> GatewayResult<Json<SubmitResponse>> {
    let task_id = state
        .manager
        .submit(&req.workflow_type, req.context, req.metadata, &req.user_id)
        .await?;

    let manager = state.manager.clone();
    let spawned_id = task_id.clone();
    tokio::spawn(async move {
        manager.run_to_completion(&spawned_id).await;
    });

    Ok(Json(SubmitResponse { task_id }))
}

#[derive(Debug, Serialize)]
pub struct TaskStatusResponse {
    id: String,
    #[serde(rename = "type")]
    task_type: String,
    status: a2a_core::TaskStatus,
    #[serde(rename = "workflowType")]
    workflow_type: String,
    #[serde(rename = "currentAgent")]
    current_agent: Option<String>,
    #[serde(rename = "currentStep")]
    current_step: usize,
    #[serde(rename = "totalSteps")]
    total_steps: usize,
    progress: u8,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
    #[serde(rename = "errorMessage", skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
}

impl From<Task> for TaskStatusResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            task_type: task.task_type,
            status: task.status,
            workflow_type: task.workflow_type,
            current_agent: task.current_agent,
            current_step: task.current_step,
            total_steps: task.total_steps,
            progress: task.progress_percent(),
            created: task.created,
            updated: task.updated,
            error_message: task.error_message,
        }
    }
}

pub async fn get_task(State(state): State<AppState>, Path(task_id): Path<String>) -> GatewayResult<Json<TaskStatusResponse>> {
    let task = state.manager.get_task(&task_id).await?;
    Ok(Json(task.into()))
}

#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    status: Option<String>,
    #[serde(rename = "workflowType")]
    workflow_type: Option<String>,
    #[serde(rename = "userId")]
    user_id: Option<String>,
    #[serde(rename = "createdAfter")]
    created_after: Option<DateTime<Utc>>,
    #[serde(rename = "createdBefore")]
    created_before: Option<DateTime<Utc>>,
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(q): Query<ListTasksQuery>,
) -> GatewayResult<Json<Vec<TaskStatusResponse>>> {
    let status = q
        .status
        .map(|s| parse_status(&s))
        .transpose()?;

    let filter = TaskFilter {
        status,
        workflow_type: q.workflow_type,
        user_id: q.user_id,
        created_after: q.created_after,
        created_before: q.created_before,
    };

    let tasks = state.manager.list_tasks(&filter).await?;
    Ok(Json(tasks.into_iter().map(TaskStatusResponse::from).collect()))
}

fn parse_status(raw: &str) -> GatewayResult<a2a_core::TaskStatus> {
    use a2a_core::TaskStatus::*;
    match raw.to_ascii_lowercase().as_str() {
        "pending" => Ok(Pending),
        "running" => Ok(Running),
        "completed" => Ok(Completed),
        "failed" => Ok(Failed),
        "cancelled" | "canceled" => Ok(Cancelled),
        other => Err(GatewayError::BadRequest(format!("unknown task status '{other}'"))),
    }
}

pub async fn cancel_task(State(state): State<AppState>, Path(task_id): Path<String>) -> GatewayResult<StatusCode> {
    state.manager.cancel(&task_id).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn replay_task(State(state): State<AppState>, Path(task_id): Path<String>) -> GatewayResult<Json<TaskStatusResponse>> {
    let task = state.manager.replay(&task_id).await?;

    let manager = state.manager.clone();
    let spawned_id = task_id.clone();
    tokio::spawn(async move {
        manager.run_to_completion(&spawned_id).await;
    });

    Ok(Json(task.into()))
}

#[derive(Debug, Deserialize)]
pub struct ArtifactsQuery {
    #[serde(rename = "agentType")]
    agent_type: Option<String>,
    #[serde(rename = "type")]
    artifact_type: Option<String>,
}

pub async fn get_artifacts(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Query(q): Query<ArtifactsQuery>,
) -> GatewayResult<Json<Vec<Artifact>>> {
    let artifacts = state
        .manager
        .get_artifacts(&task_id, q.agent_type.as_deref(), q.artifact_type.as_deref())
        .await?;
    Ok(Json(artifacts))
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    since: Option<DateTime<Utc>>,
}

pub async fn get_messages(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Query(q): Query<MessagesQuery>,
) -> GatewayResult<Json<Vec<Message>>> {
    let messages = state.manager.get_messages(&task_id, q.since).await?;
    Ok(Json(messages))
}
