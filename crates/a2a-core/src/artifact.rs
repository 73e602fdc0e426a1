// Artifact - the immutable, typed output a stage hands to the next one.
//
// Artifacts are write-once: once stored, no field may change. The tuple
// (task_id, agent_type, type) is the idempotency key producers must respect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub task_id: String,
    pub agent_type: String,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub mime_type: String,
    pub data: Value,
    pub size_bytes: usize,
    pub checksum: String,
    pub created: DateTime<Utc>,
}

impl Artifact {
    pub fn new(task_id: impl Into<String>, agent_type: impl Into<String>, artifact_type: impl Into<String>, data: Value) -> Self {
        let serialized = serde_json::to_vec(&data).unwrap_or_default();
        let checksum = format!("{:x}", Sha256::digest(&serialized));
        Self {
            id: Uuid::new_v4().to_string(),
            task_id: task_id.into(),
            agent_type: agent_type.into(),
            artifact_type: artifact_type.into(),
            mime_type: "application/json".to_string(),
            size_bytes: serialized.len(),
            checksum,
            data,
            created: Utc::now(),
        }
    }

    /// Verifies the stored checksum still matches the stored payload.
    pub fn verify_checksum(&self) -> bool {
        let serialized = serde_json::to_vec(&self.data).unwrap_or_default();
        let recomputed = format!("{:x}", Sha256::digest(&serialized));
        recomputed == self.checksum
    }
}

/// Well-known artifact type tags produced by the five concrete agents.
/// Kept as string constants (not an enum) because the artifact store and
/// the wire contract key on the raw string in `Artifact::artifact_type`.
pub mod artifact_types {
    pub const IMPORT_RESULT: &str = "bookmark_import_result";
    pub const VALIDATION_RESULT: &str = "bookmark_validation_result";
    pub const ENRICHMENT_RESULT: &str = "bookmark_enrichment_result";
    pub const CATEGORIZATION_RESULT: &str = "bookmark_categorization_result";
    pub const EMBEDDING_RESULT: &str = "bookmark_embedding_result";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn checksum_is_stable_for_identical_payloads() {
        let a = Artifact::new("t1", "import", artifact_types::IMPORT_RESULT, json!({"insertedCount": 3}));
        let b = Artifact::new("t1", "import", artifact_types::IMPORT_RESULT, json!({"insertedCount": 3}));
        assert_eq!(a.checksum, b.checksum);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn verify_checksum_detects_tampering() {
        let mut artifact = Artifact::new("t1", "import", artifact_types::IMPORT_RESULT, json!({"insertedCount": 3}));
        assert!(artifact.verify_checksum());
        artifact.data = json!({"insertedCount": 4});
        assert!(!artifact.verify_checksum());
    }
}
