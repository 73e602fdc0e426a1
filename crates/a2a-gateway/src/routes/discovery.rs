// Discovery Endpoints (C9): read-only reflection of whatever's bound in the
// Agent Registry. No authentication, no side effects — callers use these to
// decide whether a workflow is runnable before submitting it.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{GatewayError, GatewayResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct AgentEndpoint {
    #[serde(rename = "agentType")]
    agent_type: String,
    #[serde(rename = "outputType")]
    output_type: String,
    protocols: Vec<String>,
    status: a2a_core::CapabilityStatus,
}

/// Serves the well-known A2A service document: identity, supported
/// protocols, and one entry per active agent capability card.
pub async fn well_known_agent(State(state): State<AppState>) -> Json<Value> {
    let registry = state.agents.read().await;
    let agents: Vec<AgentEndpoint> = registry
        .list_active()
        .into_iter()
        .map(|card| AgentEndpoint {
            agent_type: card.agent_type.clone(),
            output_type: card.outputs.artifact_type.clone(),
            protocols: card.protocols.clone(),
            status: card.status,
        })
        .collect();

    Json(json!({
        "service": "a2a-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "protocols": ["a2a"],
        "agents": agents,
    }))
}

pub async fn agent_capabilities(
    State(state): State<AppState>,
    Path(agent_type): Path<String>,
) -> GatewayResult<Json<a2a_core::AgentCapabilityCard>> {
    let registry = state.agents.read().await;
    registry
        .card(&agent_type)
        .cloned()
        .map(Json)
        .ok_or_else(|| GatewayError::Core(a2a_core::Error::not_found(format!("agent '{agent_type}'"))))
}
