// Admin/health surface: liveness probe plus a listing of the workflows this
// process is configured to run, useful for a deploy's readiness check.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub async fn list_workflows(State(state): State<AppState>) -> Json<Value> {
    let workflows = state.workflows.read().await;
    let names = workflows.names();
    Json(json!({ "workflows": names }))
}
