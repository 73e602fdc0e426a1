// WorkflowDefinition - a named, ordered sequence of agent types a Task walks.
//
// Loaded the same dual-format way as AgentCapabilityCard: either a flat
// {name, agents: [...]} object or a Kubernetes-style envelope.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "WorkflowDefinitionInput")]
pub struct WorkflowDefinition {
    pub name: String,
    pub agents: Vec<String>,
    pub description: String,
}

impl WorkflowDefinition {
    pub fn new(name: impl Into<String>, agents: Vec<impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            agents: agents.into_iter().map(Into::into).collect(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum WorkflowDefinitionInput {
    Flat(FlatWorkflowDefinition),
    Kubernetes(KubernetesWorkflowDefinition),
}

#[derive(Debug, Clone, Deserialize)]
struct FlatWorkflowDefinition {
    name: String,
    agents: Vec<String>,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Clone, Deserialize)]
struct KubernetesWorkflowDefinition {
    #[serde(rename = "apiVersion")]
    #[allow(dead_code)]
    api_version: String,
    #[allow(dead_code)]
    kind: String,
    metadata: KubernetesMetadata,
    spec: WorkflowSpec,
}

#[derive(Debug, Clone, Deserialize)]
struct KubernetesMetadata {
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct WorkflowSpec {
    agents: Vec<String>,
    #[serde(default)]
    description: String,
}

impl From<WorkflowDefinitionInput> for WorkflowDefinition {
    fn from(input: WorkflowDefinitionInput) -> Self {
        match input {
            WorkflowDefinitionInput::Flat(flat) => WorkflowDefinition {
                name: flat.name,
                agents: flat.agents,
                description: flat.description,
            },
            WorkflowDefinitionInput::Kubernetes(k8s) => WorkflowDefinition {
                name: k8s.metadata.name,
                agents: k8s.spec.agents,
                description: k8s.spec.description,
            },
        }
    }
}

/// The workflows registered unconditionally so the process is usable with
/// zero external configuration.
pub fn builtin_workflows() -> Vec<WorkflowDefinition> {
    vec![
        WorkflowDefinition::new(
            "full_import",
            vec!["import", "validation", "enrichment", "categorization", "embedding"],
        )
        .with_description("Full bookmark ingestion pipeline"),
        WorkflowDefinition::new("quick_import", vec!["import", "validation"])
            .with_description("Import and reachability check only, no AI stages"),
        WorkflowDefinition::new("validate_enrich", vec!["validation", "enrichment"])
            .with_description("Re-run validation and enrichment on existing bookmarks"),
        WorkflowDefinition::new("import_only", vec!["import"])
            .with_description("Parse and insert bookmarks without further processing"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_workflows_cover_the_five_stage_pipeline() {
        let workflows = builtin_workflows();
        let full = workflows.iter().find(|w| w.name == "full_import").unwrap();
        assert_eq!(full.agents, vec!["import", "validation", "enrichment", "categorization", "embedding"]);
    }

    #[test]
    fn flat_definition_deserializes() {
        let yaml = r#"
name: custom
agents: [import, validation]
"#;
        let def: WorkflowDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.name, "custom");
        assert_eq!(def.agents.len(), 2);
    }

    #[test]
    fn kubernetes_style_definition_deserializes() {
        let yaml = r#"
apiVersion: a2a.dev/v1
kind: WorkflowDefinition
metadata:
  name: k8s-style
spec:
  agents: [import]
  description: minimal
"#;
        let def: WorkflowDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.name, "k8s-style");
        assert_eq!(def.description, "minimal");
    }
}
