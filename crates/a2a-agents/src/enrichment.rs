// Enrichment Agent (4.6.3): calls an AI completion client per bookmark to
// derive a category suggestion, tags, and a summary, throttled against the
// external call budget.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use a2a_core::{Agent, AgentCapabilityCard, AgentContext, AgentOutcome, Error, Result};
use a2a_runtime::{RateLimiter, StagePool};

use crate::bookmarks::{Bookmark, BookmarkStore};
use crate::capability::{AiClient, MockAiClient};

const DEFAULT_CONCURRENCY: usize = 5;

#[derive(Debug, Deserialize)]
struct EnrichmentInput {
    #[serde(rename = "bookmarkIds")]
    bookmark_ids: Vec<String>,
    #[serde(rename = "userId")]
    user_id: String,
    #[serde(rename = "validationResults", default)]
    validation_results: Option<Vec<ValidationResultRef>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ValidationResultRef {
    #[serde(rename = "bookmarkId")]
    bookmark_id: String,
    validated: bool,
}

fn parse_input(ctx: &AgentContext<'_>) -> Result<EnrichmentInput> {
    serde_json::from_value(Value::Object(ctx.task.context.clone()))
        .map_err(|e| Error::validation(format!("missing required enrichment inputs: {e}")))
}

#[derive(Debug, Clone, serde::Serialize)]
struct EnrichmentItemResult {
    #[serde(rename = "bookmarkId")]
    bookmark_id: String,
    url: String,
    enriched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub struct EnrichmentAgent {
    card: AgentCapabilityCard,
    store: Arc<dyn BookmarkStore>,
    ai: Arc<dyn AiClient>,
    pool: StagePool,
    limiter: RateLimiter,
}

impl EnrichmentAgent {
    pub fn new(store: Arc<dyn BookmarkStore>, ai: Arc<dyn AiClient>) -> Self {
        let card = AgentCapabilityCard::builder("enrichment", a2a_core::artifact_types::ENRICHMENT_RESULT)
            .description("Derives a category suggestion, tags, and a summary for each bookmark via an AI client")
            .input("bookmarkIds", "array", true)
            .input("userId", "string", true)
            .output_field("enrichedCount", "integer")
            .output_field("failedCount", "integer")
            .build();
        Self { card, store, ai, pool: StagePool::new(DEFAULT_CONCURRENCY), limiter: RateLimiter::default_ai_calls() }
    }

    pub fn mock(store: Arc<dyn BookmarkStore>) -> Self {
        Self::new(store, Arc::new(MockAiClient))
    }

    async fn enrich_one(ai: Arc<dyn AiClient>, limiter: RateLimiter, cancelled: impl Fn() -> bool, bookmark: Bookmark) -> EnrichOutcome {
        if !limiter.acquire_or_cancel(&cancelled).await {
            return EnrichOutcome {
                bookmark_id: bookmark.id,
                url: bookmark.url,
                suggestion: None,
                error: Some("cancelled while waiting for AI rate limit".into()),
            };
        }

        match ai.enrich(&bookmark.url, &bookmark.title, &bookmark.description).await {
            Ok(suggestion) => EnrichOutcome { bookmark_id: bookmark.id, url: bookmark.url, suggestion: Some(suggestion), error: None },
            Err(err) => {
                EnrichOutcome { bookmark_id: bookmark.id, url: bookmark.url, suggestion: None, error: Some(err.to_string()) }
            }
        }
    }
}

struct EnrichOutcome {
    bookmark_id: String,
    url: String,
    suggestion: Option<crate::capability::EnrichmentSuggestion>,
    error: Option<String>,
}

#[async_trait]
impl Agent for EnrichmentAgent {
    fn capabilities(&self) -> &AgentCapabilityCard {
        &self.card
    }

    fn validate(&self, ctx: &AgentContext<'_>) -> Result<()> {
        parse_input(ctx).map(|_| ())
    }

    async fn process(&self, ctx: &AgentContext<'_>) -> Result<AgentOutcome> {
        let input = parse_input(ctx)?;
        let bookmarks = self.store.get_many(&input.user_id, &input.bookmark_ids).await?;

        let bookmarks: Vec<Bookmark> = match &input.validation_results {
            Some(results) => {
                let invalid: std::collections::HashSet<&str> =
                    results.iter().filter(|r| !r.validated).map(|r| r.bookmark_id.as_str()).collect();
                bookmarks.into_iter().filter(|b| !invalid.contains(b.id.as_str())).collect()
            }
            None => bookmarks,
        };
        let total = bookmarks.len();

        if ctx.is_cancelled() {
            return Ok(AgentOutcome::Failed { error: "cancelled before enrichment started".into() });
        }

        ctx.report_progress(5, "starting enrichment calls");

        let ai = Arc::clone(&self.ai);
        let limiter = self.limiter.clone();
        let results = self
            .pool
            .run_bounded(bookmarks, || ctx.is_cancelled(), move |bookmark| {
                let ai = Arc::clone(&ai);
                let limiter = limiter.clone();
                async move { EnrichmentAgent::enrich_one(ai, limiter, || false, bookmark).await }
            })
            .await;

        let mut enriched_count = 0usize;
        let mut failed_count = 0usize;
        let mut item_results = Vec::with_capacity(results.len());
        let mut processed = 0usize;

        for outcome in results {
            processed += 1;
            if processed % 5 == 0 || processed == total {
                let pct = 10 + ((80 * processed) / total.max(1)).min(80);
                ctx.report_progress(pct as u8, &format!("enriched {processed}/{total}"));
            }

            let EnrichOutcome { bookmark_id, url, suggestion, error } = outcome;

            match suggestion {
                Some(suggestion) => {
                    let data = json!({
                        "suggestedCategory": suggestion.category,
                        "keywords": suggestion.keywords,
                    });
                    let data_map = match data {
                        Value::Object(map) => map,
                        _ => Map::new(),
                    };
                    if let Err(err) =
                        self.store.update_enrichment(&bookmark_id, suggestion.tags.clone(), suggestion.summary.clone(), data_map).await
                    {
                        tracing::warn!(bookmark_id, error = %err, "enrichment DB update failed; result still counted");
                    }
                    enriched_count += 1;
                    item_results.push(EnrichmentItemResult {
                        bookmark_id,
                        url,
                        enriched: true,
                        category: Some(suggestion.category),
                        tags: Some(suggestion.tags),
                        summary: Some(suggestion.summary),
                        keywords: Some(suggestion.keywords),
                        error: None,
                    });
                }
                None => {
                    failed_count += 1;
                    item_results.push(EnrichmentItemResult {
                        bookmark_id,
                        url,
                        enriched: false,
                        category: None,
                        tags: None,
                        summary: None,
                        keywords: None,
                        error,
                    });
                }
            }
        }

        ctx.report_progress(100, "enrichment complete");

        Ok(AgentOutcome::Completed {
            artifact_type: a2a_core::artifact_types::ENRICHMENT_RESULT.to_string(),
            data: json!({
                "enrichedCount": enriched_count,
                "failedCount": failed_count,
                "enrichmentResults": item_results,
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
        a2a_core::Task::new("bookmark_workflow", "quick_import", vec!["enrichment".into()], "u1", map, Map::new())
    }

    #[tokio::test]
    async fn enriches_bookmarks_and_writes_tags_and_summary() {
        let store = Arc::new(InMemoryBookmarkStore::new());
        let (bm, _) = store.insert_or_update("u1", "https://docs.rs/tokio", "Tokio Documentation").await.unwrap();

        let agent = EnrichmentAgent::mock(store.clone());
        let task = task_with(json!({"bookmarkIds": [bm.id.clone()], "userId": "u1"}));
        let ctx = AgentContext::new(&task, |_, _| {}, || false);

        let outcome = agent.process(&ctx).await.unwrap();
        let AgentOutcome::Completed { data, .. } = outcome else { panic!("expected completed") };
        assert_eq!(data["enrichedCount"], 1);
        assert_eq!(data["failedCount"], 0);

        let reloaded = store.get_many("u1", &[bm.id]).await.unwrap();
        assert!(reloaded[0].ai_summary.is_some());
        assert!(!reloaded[0].ai_tags.is_empty());
    }

    #[tokio::test]
    async fn ai_failure_is_recorded_without_failing_the_task() {
        struct FailingAiClient;
        #[async_trait]
        impl AiClient for FailingAiClient {
            async fn enrich(&self, _url: &str, _title: &str, _description: &str) -> Result<crate::capability::EnrichmentSuggestion> {
                Err(Error::internal("model unavailable"))
            }
        }

        let store = Arc::new(InMemoryBookmarkStore::new());
        let (bm, _) = store.insert_or_update("u1", "https://example.test", "Example").await.unwrap();
        let agent = EnrichmentAgent::new(store, Arc::new(FailingAiClient));
        let task = task_with(json!({"bookmarkIds": [bm.id], "userId": "u1"}));
        let ctx = AgentContext::new(&task, |_, _| {}, || false);

        let outcome = agent.process(&ctx).await.unwrap();
        let AgentOutcome::Completed { data, .. } = outcome else { panic!("expected completed") };
        assert_eq!(data["enrichedCount"], 0);
        assert_eq!(data["failedCount"], 1);
    }

    #[tokio::test]
    async fn bookmarks_marked_invalid_by_validation_are_skipped() {
        let store = Arc::new(InMemoryBookmarkStore::new());
        let (keep, _) = store.insert_or_update("u1", "https://docs.rs/tokio", "Tokio Documentation").await.unwrap();
        let (skip, _) = store.insert_or_update("u1", "https://dead-link.test", "Dead Link").await.unwrap();

        let agent = EnrichmentAgent::mock(store.clone());
        let task = task_with(json!({
            "bookmarkIds": [keep.id.clone(), skip.id.clone()],
            "userId": "u1",
            "validationResults": [
                {"bookmarkId": keep.id, "validated": true},
                {"bookmarkId": skip.id, "validated": false},
            ],
        }));
        let ctx = AgentContext::new(&task, |_, _| {}, || false);

        let outcome = agent.process(&ctx).await.unwrap();
        let AgentOutcome::Completed { data, .. } = outcome else { panic!("expected completed") };
        assert_eq!(data["enrichedCount"], 1);
        assert_eq!(data["failedCount"], 0);
        assert_eq!(data["enrichmentResults"].as_array().unwrap().len(), 1);
    }
}
