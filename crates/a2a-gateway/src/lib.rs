// HTTP surface for the A2A workflow runtime: Task API, progress SSE stream,
// discovery, and admin/health. Depends on `a2a-runtime`'s `TaskManager` for
// everything stateful; this crate only translates HTTP <-> the workspace's
// own types and never holds workflow state of its own.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use config::GatewayConfig;
pub use state::AppState;

/// Builds the full route tree. Split out from `serve` so tests can mount it
/// over an in-process `tower::ServiceExt::oneshot` call without binding a
/// socket.
pub fn build_router(state: AppState, config: &GatewayConfig) -> Router {
    let mut router = Router::new()
        .route("/health", get(routes::admin::health))
        .route("/workflows", get(routes::admin::list_workflows))
        .route("/.well-known/agent.json", get(routes::discovery::well_known_agent))
        .route("/api/agents/:agent_type/capabilities", get(routes::discovery::agent_capabilities))
        .route("/tasks", post(routes::tasks::submit).get(routes::tasks::list_tasks))
        .route("/tasks/:task_id", get(routes::tasks::get_task))
        .route("/tasks/:task_id/cancel", post(routes::tasks::cancel_task))
        .route("/tasks/:task_id/replay", post(routes::tasks::replay_task))
        .route("/tasks/:task_id/artifacts", get(routes::tasks::get_artifacts))
        .route("/tasks/:task_id/messages", get(routes::tasks::get_messages))
        .route("/tasks/:task_id/stream", get(routes::stream::stream_task))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeout_secs)))
        .with_state(state);

    if config.cors {
        router = router.layer(CorsLayer::permissive());
    }

    router
}

/// Binds `config`'s address and serves `state`'s router until ctrl-c,
/// shutting down gracefully so an in-flight request finishes rather than
/// being cut off mid-response.
pub async fn serve(state: AppState, config: GatewayConfig) -> anyhow::Result<()> {
    let router = build_router(state, &config);
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(addr = %addr, "a2a-gateway listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to install ctrl-c handler");
        return;
    }
    tracing::info!("shutdown signal received, draining in-flight requests");
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use tokio::sync::RwLock;
    use tower::ServiceExt;

    use a2a_core::{AgentRegistry, WorkflowRegistry};
    use a2a_runtime::{ProgressHub, TaskManager};
    use a2a_store::{InMemoryArtifactStore, InMemoryMessageLog, InMemoryTaskStore};

    fn test_state() -> AppState {
        let tasks = Arc::new(InMemoryTaskStore::new());
        let artifacts = Arc::new(InMemoryArtifactStore::new());
        let messages = Arc::new(InMemoryMessageLog::new());
        let agents = Arc::new(RwLock::new(AgentRegistry::new()));
        let workflows = Arc::new(RwLock::new(WorkflowRegistry::with_builtins()));
        let progress = Arc::new(ProgressHub::new());

        let manager = Arc::new(TaskManager::new(tasks, artifacts, messages, agents.clone(), workflows.clone(), progress.clone()));
        AppState::new(manager, progress, agents, workflows)
    }

    #[tokio::test]
    async fn health_check_returns_ok() {
        let config = GatewayConfig::default();
        let router = build_router(test_state(), &config);

        let response = router
            .oneshot(axum::http::Request::builder().uri("/health").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn well_known_agent_json_lists_no_agents_when_registry_is_empty() {
        let config = GatewayConfig::default();
        let router = build_router(test_state(), &config);

        let response = router
            .oneshot(
                axum::http::Request::builder()
                    .uri("/.well-known/agent.json")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn submit_rejects_unknown_workflow_with_404() {
        let config = GatewayConfig::default();
        let router = build_router(test_state(), &config);

        let body = serde_json::json!({"workflowType": "no_such_workflow", "userId": "u1"}).to_string();
        let response = router
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/tasks")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
    }
}
