// The Agent Runtime base contract (capabilities/validate/process) and the
// Agent Capability Card every concrete agent publishes.
//
// Mirrors the dual flat/Kubernetes-style config pattern used elsewhere in
// this codebase for workflow and context resources: a card can be written
// either as a flat object or as an apiVersion/kind/metadata/spec envelope.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityStatus {
    Active,
    Inactive,
    Deprecated,
}

/// A single named, typed field of an agent's input or output contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Declared output contract: exactly one artifact type, with a schema hint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSpec {
    #[serde(rename = "type")]
    pub artifact_type: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// The Agent Capability Card: what external callers/discovery learn about an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "CapabilityCardInput")]
pub struct AgentCapabilityCard {
    pub agent_type: String,
    pub version: String,
    pub description: String,
    pub inputs: Vec<FieldSpec>,
    pub outputs: OutputSpec,
    pub endpoints: Vec<String>,
    pub authentication: Option<String>,
    pub protocols: Vec<String>,
    pub status: CapabilityStatus,
    pub last_heartbeat: Option<DateTime<Utc>>,
}

impl AgentCapabilityCard {
    pub fn builder(agent_type: impl Into<String>, output_artifact_type: impl Into<String>) -> AgentCapabilityCardBuilder {
        AgentCapabilityCardBuilder {
            agent_type: agent_type.into(),
            version: "0.1.0".to_string(),
            description: String::new(),
            inputs: Vec::new(),
            output_artifact_type: output_artifact_type.into(),
            output_fields: Vec::new(),
            endpoints: Vec::new(),
            authentication: None,
            protocols: vec!["a2a".to_string()],
        }
    }

    pub fn touch_heartbeat(&mut self) {
        self.last_heartbeat = Some(Utc::now());
    }
}

pub struct AgentCapabilityCardBuilder {
    agent_type: String,
    version: String,
    description: String,
    inputs: Vec<FieldSpec>,
    output_artifact_type: String,
    output_fields: Vec<FieldSpec>,
    endpoints: Vec<String>,
    authentication: Option<String>,
    protocols: Vec<String>,
}

impl AgentCapabilityCardBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn input(mut self, name: impl Into<String>, field_type: impl Into<String>, required: bool) -> Self {
        self.inputs.push(FieldSpec {
            name: name.into(),
            field_type: field_type.into(),
            required,
            description: None,
        });
        self
    }

    pub fn output_field(mut self, name: impl Into<String>, field_type: impl Into<String>) -> Self {
        self.output_fields.push(FieldSpec {
            name: name.into(),
            field_type: field_type.into(),
            required: true,
            description: None,
        });
        self
    }

    pub fn build(self) -> AgentCapabilityCard {
        AgentCapabilityCard {
            agent_type: self.agent_type,
            version: self.version,
            description: self.description,
            inputs: self.inputs,
            outputs: OutputSpec {
                artifact_type: self.output_artifact_type,
                fields: self.output_fields,
            },
            endpoints: self.endpoints,
            authentication: self.authentication,
            protocols: self.protocols,
            status: CapabilityStatus::Active,
            last_heartbeat: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum CapabilityCardInput {
    Flat(FlatCapabilityCard),
    Kubernetes(KubernetesCapabilityCard),
}

#[derive(Debug, Clone, Deserialize)]
struct FlatCapabilityCard {
    agent_type: String,
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    inputs: Vec<FieldSpec>,
    outputs: OutputSpec,
    #[serde(default)]
    endpoints: Vec<String>,
    #[serde(default)]
    authentication: Option<String>,
    #[serde(default = "default_protocols")]
    protocols: Vec<String>,
    #[serde(default = "default_status")]
    status: CapabilityStatus,
}

#[derive(Debug, Clone, Deserialize)]
struct KubernetesCapabilityCard {
    #[serde(rename = "apiVersion")]
    #[allow(dead_code)]
    api_version: String,
    #[allow(dead_code)]
    kind: String,
    metadata: KubernetesMetadata,
    spec: CapabilitySpec,
}

#[derive(Debug, Clone, Deserialize)]
struct KubernetesMetadata {
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CapabilitySpec {
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    inputs: Vec<FieldSpec>,
    outputs: OutputSpec,
    #[serde(default)]
    endpoints: Vec<String>,
    #[serde(default)]
    authentication: Option<String>,
    #[serde(default = "default_protocols")]
    protocols: Vec<String>,
    #[serde(default = "default_status")]
    status: CapabilityStatus,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_protocols() -> Vec<String> {
    vec!["a2a".to_string()]
}

fn default_status() -> CapabilityStatus {
    CapabilityStatus::Active
}

impl From<CapabilityCardInput> for AgentCapabilityCard {
    fn from(input: CapabilityCardInput) -> Self {
        match input {
            CapabilityCardInput::Flat(flat) => AgentCapabilityCard {
                agent_type: flat.agent_type,
                version: flat.version,
                description: flat.description,
                inputs: flat.inputs,
                outputs: flat.outputs,
                endpoints: flat.endpoints,
                authentication: flat.authentication,
                protocols: flat.protocols,
                status: flat.status,
                last_heartbeat: None,
            },
            CapabilityCardInput::Kubernetes(k8s) => AgentCapabilityCard {
                agent_type: k8s.metadata.name,
                version: k8s.spec.version,
                description: k8s.spec.description,
                inputs: k8s.spec.inputs,
                outputs: k8s.spec.outputs,
                endpoints: k8s.spec.endpoints,
                authentication: k8s.spec.authentication,
                protocols: k8s.spec.protocols,
                status: k8s.spec.status,
                last_heartbeat: None,
            },
        }
    }
}

/// Per-invocation context handed to `Agent::process`. Carries the merged
/// workflow context plus a progress sink and a cancellation check; agents
/// must never mutate artifacts they read out of `task.context`.
pub struct AgentContext<'a> {
    pub task: &'a Task,
    progress: Box<dyn Fn(u8, &str) + Send + Sync + 'a>,
    cancelled: Box<dyn Fn() -> bool + Send + Sync + 'a>,
}

impl<'a> AgentContext<'a> {
    pub fn new(
        task: &'a Task,
        progress: impl Fn(u8, &str) + Send + Sync + 'a,
        cancelled: impl Fn() -> bool + Send + Sync + 'a,
    ) -> Self {
        Self {
            task,
            progress: Box::new(progress),
            cancelled: Box::new(cancelled),
        }
    }

    pub fn report_progress(&self, percent: u8, detail: impl AsRef<str>) {
        (self.progress)(percent, detail.as_ref());
    }

    pub fn is_cancelled(&self) -> bool {
        (self.cancelled)()
    }

    /// Typed read of a field the workflow context carries for this stage's input.
    pub fn input<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.task.context.get(key).and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Outcome of a single agent invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AgentOutcome {
    Completed {
        #[serde(rename = "type")]
        artifact_type: String,
        data: Value,
    },
    Failed {
        error: String,
    },
}

/// The base contract every concrete agent implements.
#[async_trait]
pub trait Agent: Send + Sync {
    fn capabilities(&self) -> &AgentCapabilityCard;

    /// Checks that `ctx.task.context` carries everything this agent's
    /// declared `inputs` require, without performing any work.
    fn validate(&self, ctx: &AgentContext<'_>) -> Result<()>;

    async fn process(&self, ctx: &AgentContext<'_>) -> Result<AgentOutcome>;
}

pub type AgentHandle = std::sync::Arc<dyn Agent>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_produces_active_card_with_single_output() {
        let card = AgentCapabilityCard::builder("import", "bookmark_import_result")
            .description("Parses bookmark archives")
            .input("filePath", "string", true)
            .output_field("insertedCount", "integer")
            .build();

        assert_eq!(card.agent_type, "import");
        assert_eq!(card.status, CapabilityStatus::Active);
        assert_eq!(card.outputs.artifact_type, "bookmark_import_result");
        assert_eq!(card.inputs.len(), 1);
    }

    #[test]
    fn flat_card_deserializes() {
        let yaml = r#"
agent_type: validation
outputs:
  type: bookmark_validation_result
"#;
        let card: AgentCapabilityCard = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(card.agent_type, "validation");
        assert_eq!(card.version, "0.1.0");
        assert_eq!(card.protocols, vec!["a2a".to_string()]);
    }

    #[test]
    fn kubernetes_style_card_deserializes() {
        let yaml = r#"
apiVersion: a2a.dev/v1
kind: AgentCapabilityCard
metadata:
  name: embedding
spec:
  outputs:
    type: bookmark_embedding_result
"#;
        let card: AgentCapabilityCard = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(card.agent_type, "embedding");
        assert_eq!(card.outputs.artifact_type, "bookmark_embedding_result");
    }
}
