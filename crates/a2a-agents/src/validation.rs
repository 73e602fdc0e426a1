// Validation Agent (4.6.2): checks reachability of each bookmark's URL
// through a shared, capacity-bounded resource pool and classifies the
// outcome.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;

use a2a_core::{Agent, AgentCapabilityCard, AgentContext, AgentOutcome, Error, Result};
use a2a_runtime::{ResourcePool, StagePool};

use crate::bookmarks::BookmarkStore;
use crate::capability::{extract_metadata, looks_like_error_page, FetchOutcome, MockUrlFetcher, UrlFetcher};

const DEFAULT_CONCURRENCY: usize = 3;
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
const BROWSER_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// One slot in the shared headless-browsing pool. Carries no real browser
/// state in this codebase's in-process mock fetcher, but stands in for the
/// page/context handle a real fetcher would check out and reuse.
struct BrowserHandle {
    #[allow(dead_code)]
    slot: usize,
}

#[derive(Debug, Deserialize)]
struct ValidationInput {
    #[serde(rename = "bookmarkIds")]
    bookmark_ids: Vec<String>,
    #[serde(rename = "userId")]
    user_id: String,
    #[serde(default = "default_concurrency")]
    concurrency: usize,
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn parse_input(ctx: &AgentContext<'_>) -> Result<ValidationInput> {
    serde_json::from_value(Value::Object(ctx.task.context.clone()))
        .map_err(|e| Error::validation(format!("missing required validation inputs: {e}")))
}

#[derive(Debug, Clone, serde::Serialize)]
struct ValidationItemResult {
    #[serde(rename = "bookmarkId")]
    bookmark_id: String,
    url: String,
    validated: bool,
    #[serde(rename = "statusCode", skip_serializing_if = "Option::is_none")]
    status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<Value>,
}

/// One outcome of `validate_one`, before it's paired back up with its
/// bookmark id and url in `process`.
struct ValidateOutcome {
    status_code: Option<u16>,
    error: Option<String>,
    metadata: Option<Value>,
}

impl ValidateOutcome {
    fn valid(&self) -> bool {
        self.error.is_none()
    }
}

pub struct ValidationAgent {
    card: AgentCapabilityCard,
    store: Arc<dyn BookmarkStore>,
    fetcher: Arc<dyn UrlFetcher>,
    pool: StagePool,
    browsers: ResourcePool<BrowserHandle>,
}

impl ValidationAgent {
    pub fn new(store: Arc<dyn BookmarkStore>, fetcher: Arc<dyn UrlFetcher>) -> Self {
        Self::with_concurrency(store, fetcher, DEFAULT_CONCURRENCY)
    }

    pub fn with_concurrency(store: Arc<dyn BookmarkStore>, fetcher: Arc<dyn UrlFetcher>, concurrency: usize) -> Self {
        let card = AgentCapabilityCard::builder("validation", a2a_core::artifact_types::VALIDATION_RESULT)
            .description("Checks reachability of each bookmark's URL and extracts page metadata")
            .input("bookmarkIds", "array", true)
            .input("userId", "string", true)
            .output_field("validatedCount", "integer")
            .output_field("failedCount", "integer")
            .build();
        let capacity = concurrency.max(1);
        let browsers = ResourcePool::new((0..capacity).map(|slot| BrowserHandle { slot }).collect());
        Self { card, store, fetcher, pool: StagePool::new(capacity), browsers }
    }

    pub fn mock(store: Arc<dyn BookmarkStore>) -> Self {
        Self::new(store, Arc::new(MockUrlFetcher))
    }

    async fn validate_one(fetcher: Arc<dyn UrlFetcher>, browsers: ResourcePool<BrowserHandle>, url: String) -> ValidateOutcome {
        let _guard = match browsers.acquire(BROWSER_ACQUIRE_TIMEOUT).await {
            Ok(guard) => guard,
            Err(_) => {
                return ValidateOutcome { status_code: None, error: Some("VALIDATION_ERROR".to_string()), metadata: None };
            }
        };

        let outcome: FetchOutcome = fetcher.fetch(&url, NAVIGATION_TIMEOUT).await;

        if let Some(reason) = &outcome.error {
            return ValidateOutcome { status_code: None, error: Some(reason.clone()), metadata: None };
        }

        let status = outcome.status_code.unwrap_or(0);
        if !(200..400).contains(&status) {
            let reason = if (400..500).contains(&status) { "HTTP_4XX" } else if status >= 500 { "HTTP_5XX" } else { "VALIDATION_ERROR" };
            return ValidateOutcome { status_code: Some(status), error: Some(reason.to_string()), metadata: None };
        }

        if looks_like_error_page(&outcome.body) {
            return ValidateOutcome { status_code: Some(status), error: Some("ERROR_PAGE_DETECTED".to_string()), metadata: None };
        }

        let meta = extract_metadata(&outcome.body);
        let metadata = json!({
            "title": meta.title,
            "description": meta.description,
            "keywords": meta.keywords,
            "author": meta.author,
            "ogImage": meta.og_image,
            "favicon": meta.favicon,
        });
        ValidateOutcome { status_code: Some(status), error: None, metadata: Some(metadata) }
    }
}

#[async_trait]
impl Agent for ValidationAgent {
    fn capabilities(&self) -> &AgentCapabilityCard {
        &self.card
    }

    fn validate(&self, ctx: &AgentContext<'_>) -> Result<()> {
        parse_input(ctx).map(|_| ())
    }

    async fn process(&self, ctx: &AgentContext<'_>) -> Result<AgentOutcome> {
        let input = parse_input(ctx)?;
        let bookmarks = self.store.get_many(&input.user_id, &input.bookmark_ids).await?;
        let total = bookmarks.len();

        let fetcher = Arc::clone(&self.fetcher);
        let cancelled = ctx.is_cancelled();
        if cancelled {
            return Ok(AgentOutcome::Failed { error: "cancelled before validation started".into() });
        }

        let items: Vec<(String, String)> = bookmarks.iter().map(|b| (b.id.clone(), b.url.clone())).collect();
        let processed = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let browsers = self.browsers.clone();

        let results: Vec<(String, String, ValidateOutcome)> = self
            .pool
            .run_bounded(items, || ctx.is_cancelled(), {
                let fetcher = Arc::clone(&fetcher);
                let browsers = browsers.clone();
                move |(id, url)| {
                    let fetcher = Arc::clone(&fetcher);
                    let browsers = browsers.clone();
                    async move {
                        let outcome = ValidationAgent::validate_one(fetcher, browsers, url.clone()).await;
                        (id, url, outcome)
                    }
                }
            })
            .await;

        let mut validated_count = 0usize;
        let mut failed_count = 0usize;
        let mut item_results = Vec::with_capacity(results.len());

        for (bookmark_id, url, outcome) in results {
            let n = processed.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
            if n % 5 == 0 || n == total {
                let pct = 20 + ((70 * n) / total.max(1)).min(70);
                ctx.report_progress(pct as u8, &format!("validated {n}/{total}"));
            }

            let valid = outcome.valid();
            if valid {
                validated_count += 1;
            } else {
                failed_count += 1;
            }

            let metadata_map = match &outcome.metadata {
                Some(Value::Object(map)) => map.clone(),
                _ => Map::new(),
            };
            if let Err(err) =
                self.store.update_validation(&bookmark_id, valid, outcome.error.clone().into_iter().collect(), metadata_map).await
            {
                tracing::warn!(bookmark_id, error = %err, "validation DB update failed; result still counted");
            }

            item_results.push(ValidationItemResult {
                bookmark_id,
                url,
                validated: valid,
                status_code: outcome.status_code,
                error: outcome.error,
                metadata: outcome.metadata,
            });
        }

        ctx.report_progress(95, "validation results persisted");
        ctx.report_progress(100, "validation complete");

        Ok(AgentOutcome::Completed {
            artifact_type: a2a_core::artifact_types::VALIDATION_RESULT.to_string(),
            data: json!({
                "validatedCount": validated_count,
                "failedCount": failed_count,
                "validationResults": item_results,
            }),
        })
    }
}

#[cfg(feature = "http-fetcher")]
pub struct ReqwestUrlFetcher {
    client: reqwest::Client,
}

#[cfg(feature = "http-fetcher")]
impl ReqwestUrlFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[cfg(feature = "http-fetcher")]
#[async_trait]
impl UrlFetcher for ReqwestUrlFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchOutcome {
        let request = self.client.get(url).timeout(timeout);
        match request.send().await {
            Ok(response) => {
                let status_code = Some(response.status().as_u16());
                let body = response.text().await.unwrap_or_default();
                FetchOutcome { status_code, body, error: None }
            }
            Err(err) if err.is_timeout() => FetchOutcome { status_code: None, body: String::new(), error: Some("TIMEOUT".into()) },
            Err(err) if err.is_connect() => {
                FetchOutcome { status_code: None, body: String::new(), error: Some("CONNECTION_REFUSED".into()) }
            }
            Err(_) => FetchOutcome { status_code: None, body: String::new(), error: Some("DNS_ERROR".into()) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmarks::InMemoryBookmarkStore;
    use serde_json::Map;

    fn task_with(context: Value) -> a2a_core::Task {
        let Value::Object(map) = context else { panic!("context must be object") };
        a2a_core::Task::new("bookmark_workflow", "quick_import", vec!["validation".into()], "u1", map, Map::new())
    }

    #[tokio::test]
    async fn classifies_reachable_and_unreachable_urls() {
        let store = Arc::new(InMemoryBookmarkStore::new());
        let (ok, _) = store.insert_or_update("u1", "https://ok.test", "OK").await.unwrap();
        let (bad, _) = store.insert_or_update("u1", "https://nxdomain.test", "Bad").await.unwrap();

        let agent = ValidationAgent::mock(store.clone());
        let task = task_with(json!({"bookmarkIds": [ok.id, bad.id], "userId": "u1"}));
        let ctx = AgentContext::new(&task, |_, _| {}, || false);

        let outcome = agent.process(&ctx).await.unwrap();
        let AgentOutcome::Completed { data, .. } = outcome else { panic!("expected completed") };
        assert_eq!(data["validatedCount"], 1);
        assert_eq!(data["failedCount"], 1);

        let reloaded = store.get_many("u1", &[ok.id]).await.unwrap();
        assert_eq!(reloaded[0].is_valid, Some(true));
    }

    #[tokio::test]
    async fn error_page_with_200_status_is_still_invalid() {
        struct ErrorPageFetcher;
        #[async_trait]
        impl UrlFetcher for ErrorPageFetcher {
            async fn fetch(&self, _url: &str, _timeout: Duration) -> FetchOutcome {
                FetchOutcome { status_code: Some(200), body: "<h1>Access Denied</h1>".into(), error: None }
            }
        }

        let store = Arc::new(InMemoryBookmarkStore::new());
        let (bm, _) = store.insert_or_update("u1", "https://blocked.test", "Blocked").await.unwrap();
        let agent = ValidationAgent::new(store, Arc::new(ErrorPageFetcher));
        let task = task_with(json!({"bookmarkIds": [bm.id], "userId": "u1"}));
        let ctx = AgentContext::new(&task, |_, _| {}, || false);

        let outcome = agent.process(&ctx).await.unwrap();
        let AgentOutcome::Completed { data, .. } = outcome else { panic!("expected completed") };
        assert_eq!(data["failedCount"], 1);
    }
}
