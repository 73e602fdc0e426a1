// Thin HTTP client over a running a2a-gateway instance, used by every
// command except `run` (which executes entirely in-process) and `serve`
// (which starts the gateway). Mirrors the wire shapes in
// `a2a_gateway::routes::tasks` exactly.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use a2a_core::{Artifact, Message, Task, TaskStatus};

pub struct GatewayClient {
    base_url: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TaskStatusResponse {
    id: String,
    #[serde(rename = "type")]
    task_type: String,
    status: TaskStatus,
    #[serde(rename = "workflowType")]
    workflow_type: String,
    #[serde(rename = "currentAgent")]
    current_agent: Option<String>,
    #[serde(rename = "currentStep")]
    current_step: usize,
    #[serde(rename = "totalSteps")]
    total_steps: usize,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
    #[serde(rename = "errorMessage")]
    error_message: Option<String>,
}

impl From<TaskStatusResponse> for Task {
    fn from(r: TaskStatusResponse) -> Self {
        Task {
            id: r.id,
            task_type: r.task_type,
            status: r.status,
            workflow_type: r.workflow_type,
            workflow_agents: Vec::new(),
            current_agent: r.current_agent,
            current_step: r.current_step,
            total_steps: r.total_steps,
            context: Map::new(),
            metadata: Map::new(),
            user_id: String::new(),
            error_message: r.error_message,
            cancellation_requested: false,
            created: r.created,
            updated: r.updated,
        }
    }
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    #[serde(rename = "workflowType")]
    workflow_type: &'a str,
    context: Map<String, Value>,
    #[serde(rename = "userId")]
    user_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(rename = "taskId")]
    task_id: String,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), http: reqwest::Client::new() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub async fn submit(&self, workflow_type: &str, context: Map<String, Value>, user_id: &str) -> Result<String> {
        let response = self
            .http
            .post(self.url("/tasks"))
            .json(&SubmitRequest { workflow_type, context, user_id })
            .send()
            .await
            .context("submitting task")?;
        let response = check_status(response).await?;
        Ok(response.json::<SubmitResponse>().await?.task_id)
    }

    pub async fn get_task(&self, task_id: &str) -> Result<Task> {
        let response = self.http.get(self.url(&format!("/tasks/{task_id}"))).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<TaskStatusResponse>().await?.into())
    }

    pub async fn list_tasks(&self, status: Option<&str>) -> Result<Vec<Task>> {
        let mut request = self.http.get(self.url("/tasks"));
        if let Some(status) = status {
            request = request.query(&[("status", status)]);
        }
        let response = check_status(request.send().await?).await?;
        let tasks: Vec<TaskStatusResponse> = response.json().await?;
        Ok(tasks.into_iter().map(Task::from).collect())
    }

    pub async fn cancel(&self, task_id: &str) -> Result<()> {
        let response = self.http.post(self.url(&format!("/tasks/{task_id}/cancel"))).send().await?;
        check_status(response).await?;
        Ok(())
    }

    pub async fn replay(&self, task_id: &str) -> Result<Task> {
        let response = self.http.post(self.url(&format!("/tasks/{task_id}/replay"))).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<TaskStatusResponse>().await?.into())
    }

    pub async fn get_artifacts(&self, task_id: &str) -> Result<Vec<Artifact>> {
        let response = self.http.get(self.url(&format!("/tasks/{task_id}/artifacts"))).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    pub async fn get_messages(&self, task_id: &str) -> Result<Vec<Message>> {
        let response = self.http.get(self.url(&format!("/tasks/{task_id}/messages"))).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() || response.status().as_u16() == 202 {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    bail!("gateway returned {status}: {body}")
}
