// Message Log - append-only progress/status/error stream for a task.
//
// Never authoritative: a reader reconstructing task state must trust
// Task::status, not the last message. Messages exist for observability and
// for the Progress Stream Hub's delta feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Progress,
    Status,
    Error,
    Warning,
    Info,
    Completion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub task_id: String,
    pub agent_type: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: Map<String, Value>,
}

impl Message {
    pub fn new(
        task_id: impl Into<String>,
        agent_type: impl Into<String>,
        message_type: MessageType,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            task_id: task_id.into(),
            agent_type: agent_type.into(),
            message_type,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: Map::new(),
        }
    }

    pub fn progress(task_id: impl Into<String>, agent_type: impl Into<String>, percent: u8, processed: usize, total: usize) -> Self {
        let mut msg = Self::new(task_id, agent_type, MessageType::Progress, format!("{}% ({}/{})", percent, processed, total));
        msg.metadata.insert("progress".into(), Value::from(percent));
        msg.metadata.insert("processed".into(), Value::from(processed));
        msg.metadata.insert("total".into(), Value::from(total));
        msg
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_message_carries_percent_metadata() {
        let msg = Message::progress("t1", "import", 50, 5, 10);
        assert_eq!(msg.message_type, MessageType::Progress);
        assert_eq!(msg.metadata.get("progress"), Some(&Value::from(50)));
        assert_eq!(msg.content, "50% (5/10)");
    }

    #[test]
    fn message_type_serializes_lowercase() {
        let json = serde_json::to_string(&MessageType::Completion).unwrap();
        assert_eq!(json, "\"completion\"");
    }
}
