// Core error type for the A2A workflow runtime.
//
// Every crate in the workspace surfaces `a2a_core::Error` at its library
// boundary; `anyhow` is reserved for the two process-level boundaries
// (the CLI and the gateway's HTTP handlers).

use thiserror::Error;

/// Workspace-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Caller supplied malformed or incomplete task/agent input. Never retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A compare-and-set transition lost a race, or violated the task state machine.
    #[error("conflicting transition on {resource}: {reason}")]
    Conflict { resource: String, reason: String },

    /// Lookup against a store or registry found nothing.
    #[error("not found: {0}")]
    NotFound(String),

    /// Attempted to create a resource that already exists (e.g. a duplicate artifact).
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Task was cancelled cooperatively; partial state remains by design.
    #[error("task {0} cancelled")]
    Cancelled(String),

    /// Unhandled internal failure inside an agent or the dispatcher.
    #[error("internal error: {0}")]
    Internal(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn conflict(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Conflict {
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound(what.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    /// True for errors that never warrant a retry of the same operation.
    pub fn is_permanent(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::AlreadyExists(_) | Error::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_formats_resource_and_reason() {
        let err = Error::conflict("task:abc", "already running");
        assert_eq!(err.to_string(), "conflicting transition on task:abc: already running");
    }

    #[test]
    fn validation_errors_are_permanent() {
        assert!(Error::validation("missing field").is_permanent());
        assert!(!Error::internal("boom").is_permanent());
    }
}
