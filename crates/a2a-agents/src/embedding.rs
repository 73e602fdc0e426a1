// Embedding Agent (4.6.5): computes a fixed-dimension vector per bookmark,
// batched for both call-size and concurrency limits.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use a2a_core::{Agent, AgentCapabilityCard, AgentContext, AgentOutcome, Error, Result, EMBEDDING_VECTOR_DIMENSIONS};
use a2a_runtime::StagePool;

use crate::bookmarks::{Bookmark, BookmarkStore};
use crate::capability::{EmbeddingClient, MockEmbeddingClient};

const DEFAULT_BATCH_SIZE: usize = 20;
const DEFAULT_PARALLEL_BATCHES: usize = 5;

#[derive(Debug, Deserialize)]
struct EmbeddingInput {
    #[serde(rename = "bookmarkIds")]
    bookmark_ids: Vec<String>,
    #[serde(rename = "userId")]
    user_id: String,
    #[serde(default)]
    regenerate: bool,
}

fn parse_input(ctx: &AgentContext<'_>) -> Result<EmbeddingInput> {
    serde_json::from_value(Value::Object(ctx.task.context.clone()))
        .map_err(|e| Error::validation(format!("missing required embedding inputs: {e}")))
}

#[derive(Debug, Clone, serde::Serialize)]
struct EmbeddingItemResult {
    #[serde(rename = "bookmarkId")]
    bookmark_id: String,
    success: bool,
    #[serde(rename = "vectorDimensions", skip_serializing_if = "Option::is_none")]
    vector_dimensions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn text_representation(bookmark: &Bookmark) -> String {
    let mut parts = vec![bookmark.url.clone(), bookmark.title.clone(), bookmark.description.clone()];
    if let Some(summary) = &bookmark.ai_summary {
        parts.push(summary.clone());
    }
    parts.extend(bookmark.ai_tags.iter().cloned());
    parts.into_iter().filter(|p| !p.is_empty()).collect::<Vec<_>>().join(" ")
}

pub struct EmbeddingAgent {
    card: AgentCapabilityCard,
    store: Arc<dyn BookmarkStore>,
    client: Arc<dyn EmbeddingClient>,
    batch_size: usize,
    pool: StagePool,
}

impl EmbeddingAgent {
    pub fn new(store: Arc<dyn BookmarkStore>, client: Arc<dyn EmbeddingClient>) -> Self {
        let card = AgentCapabilityCard::builder("embedding", a2a_core::artifact_types::EMBEDDING_RESULT)
            .description("Computes a fixed-dimension embedding vector per bookmark")
            .input("bookmarkIds", "array", true)
            .input("userId", "string", true)
            .input("regenerate", "boolean", false)
            .output_field("embeddedCount", "integer")
            .output_field("vectorDimensions", "integer")
            .build();
        Self { card, store, client, batch_size: DEFAULT_BATCH_SIZE, pool: StagePool::new(DEFAULT_PARALLEL_BATCHES) }
    }

    pub fn mock(store: Arc<dyn BookmarkStore>) -> Self {
        Self::new(store, Arc::new(MockEmbeddingClient))
    }

    async fn embed_batch(client: Arc<dyn EmbeddingClient>, batch: Vec<Bookmark>) -> Vec<(String, Result<Vec<f32>>)> {
        let mut out = Vec::with_capacity(batch.len());
        for bookmark in batch {
            let text = text_representation(&bookmark);
            let result = client.embed(&text).await;
            out.push((bookmark.id, result));
        }
        out
    }
}

#[async_trait]
impl Agent for EmbeddingAgent {
    fn capabilities(&self) -> &AgentCapabilityCard {
        &self.card
    }

    fn validate(&self, ctx: &AgentContext<'_>) -> Result<()> {
        parse_input(ctx).map(|_| ())
    }

    async fn process(&self, ctx: &AgentContext<'_>) -> Result<AgentOutcome> {
        let input = parse_input(ctx)?;
        let all_bookmarks = self.store.get_many(&input.user_id, &input.bookmark_ids).await?;

        let pending: Vec<Bookmark> =
            if input.regenerate { all_bookmarks } else { all_bookmarks.into_iter().filter(|b| b.embedding.is_none()).collect() };

        let total = pending.len();
        ctx.report_progress(10, "starting embedding batches");

        if total == 0 {
            ctx.report_progress(100, "no bookmarks require an embedding");
            return Ok(AgentOutcome::Completed {
                artifact_type: a2a_core::artifact_types::EMBEDDING_RESULT.to_string(),
                data: json!({
                    "embeddedCount": 0,
                    "failedCount": 0,
                    "embeddingResults": Vec::<EmbeddingItemResult>::new(),
                    "vectorDimensions": EMBEDDING_VECTOR_DIMENSIONS,
                }),
            });
        }

        let batches: Vec<Vec<Bookmark>> = pending.chunks(self.batch_size).map(|c| c.to_vec()).collect();
        let total_batches = batches.len();

        let client = Arc::clone(&self.client);
        let batch_results = self
            .pool
            .run_bounded(batches, || ctx.is_cancelled(), move |batch| {
                let client = Arc::clone(&client);
                async move { EmbeddingAgent::embed_batch(client, batch).await }
            })
            .await;

        let mut embedded_count = 0usize;
        let mut failed_count = 0usize;
        let mut item_results = Vec::with_capacity(total);

        for (batch_index, batch) in batch_results.into_iter().enumerate() {
            for (bookmark_id, result) in batch {
                match result {
                    Ok(vector) => {
                        let vector_dimensions = vector.len();
                        if let Err(err) = self.store.update_embedding(&bookmark_id, vector).await {
                            tracing::warn!(bookmark_id, error = %err, "embedding DB update failed; result still counted");
                        }
                        embedded_count += 1;
                        item_results.push(EmbeddingItemResult {
                            bookmark_id,
                            success: true,
                            vector_dimensions: Some(vector_dimensions),
                            error: None,
                        });
                    }
                    Err(err) => {
                        failed_count += 1;
                        item_results.push(EmbeddingItemResult {
                            bookmark_id,
                            success: false,
                            vector_dimensions: None,
                            error: Some(err.to_string()),
                        });
                    }
                }
            }

            let n = batch_index + 1;
            let pct = 10 + ((85 * n) / total_batches.max(1)).min(85);
            ctx.report_progress(pct as u8, &format!("batch {n}/{total_batches} written"));
        }

        ctx.report_progress(100, "embedding complete");

        Ok(AgentOutcome::Completed {
            artifact_type: a2a_core::artifact_types::EMBEDDING_RESULT.to_string(),
            data: json!({
                "embeddedCount": embedded_count,
                "failedCount": failed_count,
                "embeddingResults": item_results,
                "vectorDimensions": EMBEDDING_VECTOR_DIMENSIONS,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmarks::InMemoryBookmarkStore;

    fn task_with(context: Value) -> a2a_core::Task {
        let Value::Object(map) = context else { panic!("context must be object") };
        a2a_core::Task::new("bookmark_workflow", "quick_import", vec!["embedding".into()], "u1", map, Map::new())
    }

    #[tokio::test]
    async fn embeds_bookmarks_lacking_a_vector() {
        let store = Arc::new(InMemoryBookmarkStore::new());
        let (bm, _) = store.insert_or_update("u1", "https://a.test", "A").await.unwrap();

        let agent = EmbeddingAgent::mock(store.clone());
        let task = task_with(json!({"bookmarkIds": [bm.id.clone()], "userId": "u1"}));
        let ctx = AgentContext::new(&task, |_, _| {}, || false);
        let outcome = agent.process(&ctx).await.unwrap();
        let AgentOutcome::Completed { data, .. } = outcome else { panic!("expected completed") };
        assert_eq!(data["embeddedCount"], 1);
        assert_eq!(data["vectorDimensions"], EMBEDDING_VECTOR_DIMENSIONS);

        let reloaded = store.get_many("u1", &[bm.id]).await.unwrap();
        assert_eq!(reloaded[0].embedding.as_ref().unwrap().len(), EMBEDDING_VECTOR_DIMENSIONS);
    }

    #[tokio::test]
    async fn already_embedded_bookmark_is_skipped_unless_regenerate() {
        let store = Arc::new(InMemoryBookmarkStore::new());
        let (bm, _) = store.insert_or_update("u1", "https://a.test", "A").await.unwrap();
        store.update_embedding(&bm.id, vec![0.0; EMBEDDING_VECTOR_DIMENSIONS]).await.unwrap();

        let agent = EmbeddingAgent::mock(store.clone());
        let task = task_with(json!({"bookmarkIds": [bm.id.clone()], "userId": "u1"}));
        let ctx = AgentContext::new(&task, |_, _| {}, || false);
        let outcome = agent.process(&ctx).await.unwrap();
        let AgentOutcome::Completed { data, .. } = outcome else { panic!("expected completed") };
        assert_eq!(data["embeddedCount"], 0);

        let task2 = task_with(json!({"bookmarkIds": [bm.id], "userId": "u1", "regenerate": true}));
        let ctx2 = AgentContext::new(&task2, |_, _| {}, || false);
        let outcome2 = agent.process(&ctx2).await.unwrap();
        let AgentOutcome::Completed { data: data2, .. } = outcome2 else { panic!("expected completed") };
        assert_eq!(data2["embeddedCount"], 1);
    }
}
