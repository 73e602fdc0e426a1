// Resource registries: the Agent Registry (capability cards + live handles)
// and the Workflow Registry (named agent sequences), both loadable from a
// directory of YAML files following the same convention this codebase uses
// for its other resource registries.

use std::collections::HashMap;
use std::path::Path;

use crate::agent::{AgentCapabilityCard, AgentHandle, CapabilityStatus};
use crate::error::{Error, Result};
use crate::workflow::WorkflowDefinition;

/// Common trait for all resource registries in the workspace.
pub trait Registry<T> {
    fn load_directory(&mut self, path: &Path) -> Result<usize>;
    fn get(&self, name: &str) -> Option<&T>;
    fn get_all(&self) -> Vec<&T>;
    fn register(&mut self, resource: T) -> Result<()>;
    fn count(&self) -> usize;

    fn exists(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Holds both the static Capability Card and, once a process has started the
/// agent, its live handle. `lookup` requires both to be present and active.
struct AgentEntry {
    card: AgentCapabilityCard,
    handle: Option<AgentHandle>,
}

#[derive(Default)]
pub struct AgentRegistry {
    agents: HashMap<String, AgentEntry>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a live handle to an already-registered (or newly registered)
    /// capability card. Required before `lookup` succeeds for that agent type.
    pub fn bind_handle(&mut self, card: AgentCapabilityCard, handle: AgentHandle) {
        let agent_type = card.agent_type.clone();
        self.agents.insert(agent_type, AgentEntry { card, handle: Some(handle) });
    }

    pub fn lookup(&self, agent_type: &str) -> Result<AgentHandle> {
        let entry = self
            .agents
            .get(agent_type)
            .ok_or_else(|| Error::not_found(format!("agent '{agent_type}'")))?;
        if entry.card.status != CapabilityStatus::Active {
            return Err(Error::validation(format!("agent '{agent_type}' is not active")));
        }
        entry
            .handle
            .clone()
            .ok_or_else(|| Error::internal(format!("agent '{agent_type}' has no bound handle")))
    }

    pub fn card(&self, agent_type: &str) -> Option<&AgentCapabilityCard> {
        self.agents.get(agent_type).map(|e| &e.card)
    }

    pub fn list_active(&self) -> Vec<&AgentCapabilityCard> {
        self.agents
            .values()
            .map(|e| &e.card)
            .filter(|c| c.status == CapabilityStatus::Active)
            .collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.agents.keys().map(|s| s.as_str()).collect()
    }

    /// True once every agent type named in `required` has an active, bound entry.
    pub fn ready_for(&self, required: &[String]) -> bool {
        required.iter().all(|agent_type| self.lookup(agent_type).is_ok())
    }
}

impl Registry<AgentCapabilityCard> for AgentRegistry {
    fn load_directory(&mut self, path: &Path) -> Result<usize> {
        if !path.exists() {
            return Ok(0);
        }
        let mut count = 0;
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let file_path = entry.path();
            if file_path.extension().map_or(false, |e| e == "yaml" || e == "yml") {
                match load_yaml_file::<AgentCapabilityCard>(&file_path) {
                    Ok(card) => {
                        let agent_type = card.agent_type.clone();
                        self.agents.insert(agent_type.clone(), AgentEntry { card, handle: None });
                        tracing::debug!(agent_type = %agent_type, "loaded agent capability card");
                        count += 1;
                    }
                    Err(e) => tracing::warn!(file = ?file_path, error = %e, "failed to load agent capability card"),
                }
            }
        }
        Ok(count)
    }

    fn get(&self, name: &str) -> Option<&AgentCapabilityCard> {
        self.card(name)
    }

    fn get_all(&self) -> Vec<&AgentCapabilityCard> {
        self.agents.values().map(|e| &e.card).collect()
    }

    fn register(&mut self, resource: AgentCapabilityCard) -> Result<()> {
        let agent_type = resource.agent_type.clone();
        self.agents.insert(agent_type, AgentEntry { card: resource, handle: None });
        Ok(())
    }

    fn count(&self) -> usize {
        self.agents.len()
    }
}

#[derive(Debug, Default)]
pub struct WorkflowRegistry {
    workflows: HashMap<String, WorkflowDefinition>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-seeded with the unconditional built-in workflows.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for workflow in crate::workflow::builtin_workflows() {
            let _ = registry.register(workflow);
        }
        registry
    }

    pub fn names(&self) -> Vec<&str> {
        self.workflows.keys().map(|s| s.as_str()).collect()
    }
}

impl Registry<WorkflowDefinition> for WorkflowRegistry {
    fn load_directory(&mut self, path: &Path) -> Result<usize> {
        if !path.exists() {
            return Ok(0);
        }
        let mut count = 0;
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let file_path = entry.path();
            if file_path.extension().map_or(false, |e| e == "yaml" || e == "yml") {
                match load_yaml_file::<WorkflowDefinition>(&file_path) {
                    Ok(workflow) => {
                        let name = workflow.name.clone();
                        self.workflows.insert(name.clone(), workflow);
                        tracing::debug!(workflow = %name, "loaded workflow definition");
                        count += 1;
                    }
                    Err(e) => tracing::warn!(file = ?file_path, error = %e, "failed to load workflow definition"),
                }
            }
        }
        Ok(count)
    }

    fn get(&self, name: &str) -> Option<&WorkflowDefinition> {
        self.workflows.get(name)
    }

    fn get_all(&self) -> Vec<&WorkflowDefinition> {
        self.workflows.values().collect()
    }

    fn register(&mut self, resource: WorkflowDefinition) -> Result<()> {
        let name = resource.name.clone();
        self.workflows.insert(name, resource);
        Ok(())
    }

    fn count(&self) -> usize {
        self.workflows.len()
    }
}

fn load_yaml_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    let resource: T = serde_yaml::from_str(&content)?;
    Ok(resource)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Agent, AgentContext, AgentOutcome};
    use async_trait::async_trait;

    struct NoopAgent(AgentCapabilityCard);

    #[async_trait]
    impl Agent for NoopAgent {
        fn capabilities(&self) -> &AgentCapabilityCard {
            &self.0
        }
        fn validate(&self, _ctx: &AgentContext<'_>) -> Result<()> {
            Ok(())
        }
        async fn process(&self, _ctx: &AgentContext<'_>) -> Result<AgentOutcome> {
            Ok(AgentOutcome::Completed { artifact_type: "noop_result".into(), data: serde_json::json!({}) })
        }
    }

    #[test]
    fn lookup_fails_until_handle_bound() {
        let card = AgentCapabilityCard::builder("import", "bookmark_import_result").build();
        let mut registry = AgentRegistry::new();
        registry.register(card.clone()).unwrap();
        assert!(registry.lookup("import").is_err());

        registry.bind_handle(card, std::sync::Arc::new(NoopAgent(AgentCapabilityCard::builder("import", "bookmark_import_result").build())));
        assert!(registry.lookup("import").is_ok());
    }

    #[test]
    fn ready_for_checks_every_required_agent() {
        let mut registry = AgentRegistry::new();
        let import_card = AgentCapabilityCard::builder("import", "bookmark_import_result").build();
        registry.bind_handle(import_card.clone(), std::sync::Arc::new(NoopAgent(import_card)));

        assert!(registry.ready_for(&["import".to_string()]));
        assert!(!registry.ready_for(&["import".to_string(), "validation".to_string()]));
    }

    #[test]
    fn workflow_registry_seeds_builtins() {
        let registry = WorkflowRegistry::with_builtins();
        assert!(registry.exists("full_import"));
        assert!(registry.exists("quick_import"));
        assert_eq!(registry.get("full_import").unwrap().agents.len(), 5);
    }
}
