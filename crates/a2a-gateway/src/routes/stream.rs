// Progress stream route (C8 over HTTP): one SSE connection per task,
// snapshot-then-tail exactly as `ProgressHub::subscribe` promises. The
// connection closes itself once a terminal event has been forwarded.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use serde_json::json;
use tokio_stream::{Stream, StreamExt};

use a2a_runtime::progress::ProgressEvent;

use crate::error::GatewayResult;
use crate::state::AppState;

pub async fn stream_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> GatewayResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let task = state.manager.get_task(&task_id).await?;
    let source = state.progress.subscribe(task);

    let events = source.map(|event| {
        let (event_name, payload, terminal) = match event {
            ProgressEvent::Snapshot(task) => (
                "status",
                json!({
                    "status": task.status,
                    "currentAgent": task.current_agent,
                    "progress": task.progress_percent(),
                }),
                task.status.is_terminal(),
            ),
            ProgressEvent::Update(message) => (
                "message",
                json!({
                    "type": message.message_type,
                    "content": message.content,
                    "metadata": message.metadata,
                }),
                false,
            ),
            ProgressEvent::Terminal(task) => (
                "status",
                json!({
                    "status": task.status,
                    "currentAgent": task.current_agent,
                    "progress": task.progress_percent(),
                    "errorMessage": task.error_message,
                }),
                true,
            ),
        };
        (Event::default().event(event_name).json_data(payload).unwrap(), terminal)
    });

    let until_terminal = take_through_terminal(events);

    Ok(Sse::new(until_terminal).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}

/// Forwards events up to and including the first terminal one, then ends the
/// stream — mirrors the hub's own "closes after the terminal event" contract
/// rather than relying on the client to disconnect.
fn take_through_terminal<S>(source: S) -> impl Stream<Item = Result<Event, Infallible>>
where
    S: Stream<Item = (Event, bool)> + Unpin,
{
    futures::stream::unfold((source, false), |(mut source, done)| async move {
        if done {
            return None;
        }
        let (event, terminal) = source.next().await?;
        Some((Ok(event), (source, terminal)))
    })
}
