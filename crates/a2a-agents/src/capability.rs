// Pluggable external capabilities the concrete agents depend on. Each trait
// has an in-process mock so the full pipeline is exercisable with zero
// external services configured; production wiring swaps in a real
// implementation (see `validation::ReqwestUrlFetcher` behind the
// `http-fetcher` feature).

use async_trait::async_trait;
use std::time::Duration;

use a2a_core::Result;

/// Outcome of fetching a single URL, consumed by the Validation agent's
/// reachability classification and metadata extraction.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub status_code: Option<u16>,
    pub body: String,
    pub error: Option<String>,
}

#[async_trait]
pub trait UrlFetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchOutcome;
}

/// Deterministic fetcher for tests and for running the pipeline with no
/// network access: URLs containing `invalid`/`error`/`404` in their host
/// simulate the corresponding failure classes, everything else "succeeds"
/// with a minimal HTML document.
pub struct MockUrlFetcher;

#[async_trait]
impl UrlFetcher for MockUrlFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> FetchOutcome {
        if url.contains("nxdomain") {
            return FetchOutcome { status_code: None, body: String::new(), error: Some("DNS_ERROR".into()) };
        }
        if url.contains("refused") {
            return FetchOutcome { status_code: None, body: String::new(), error: Some("CONNECTION_REFUSED".into()) };
        }
        if url.contains("timeout") {
            return FetchOutcome { status_code: None, body: String::new(), error: Some("TIMEOUT".into()) };
        }
        if url.contains("404") {
            return FetchOutcome { status_code: Some(404), body: "<html><title>404 Not Found</title></html>".into(), error: None };
        }
        if url.contains("500") {
            return FetchOutcome { status_code: Some(500), body: "<html><title>Server Error</title></html>".into(), error: None };
        }
        FetchOutcome {
            status_code: Some(200),
            body: format!(
                "<html><head><title>Example page</title>\
                 <meta name=\"description\" content=\"An example bookmark target\">\
                 <meta name=\"keywords\" content=\"example, bookmark\">\
                 <meta name=\"author\" content=\"Example Author\">\
                 <meta property=\"og:image\" content=\"https://example.test/og.png\">\
                 <link rel=\"icon\" href=\"/favicon.ico\"></head>\
                 <body>Welcome to {url}</body></html>"
            ),
            error: None,
        }
    }
}

/// Result of a single AI-powered enrichment call: category suggestion, tags,
/// summary, keywords.
#[derive(Debug, Clone)]
pub struct EnrichmentSuggestion {
    pub category: String,
    pub tags: Vec<String>,
    pub summary: String,
    pub keywords: Vec<String>,
}

#[async_trait]
pub trait AiClient: Send + Sync {
    async fn enrich(&self, url: &str, title: &str, description: &str) -> Result<EnrichmentSuggestion>;
}

/// Deterministic enrichment without a real model: derives a plausible
/// category from the URL/title and fabricates tags from whitespace-split
/// keywords, enough to drive the Categorization agent's scoring in tests.
pub struct MockAiClient;

#[async_trait]
impl AiClient for MockAiClient {
    async fn enrich(&self, url: &str, title: &str, description: &str) -> Result<EnrichmentSuggestion> {
        let lower = format!("{url} {title} {description}").to_lowercase();
        let category = a2a_core::DEFAULT_CATEGORIES
            .iter()
            .find(|c| lower.contains(&c.to_lowercase()))
            .copied()
            .unwrap_or("Other")
            .to_string();

        let tags: Vec<String> = title
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .filter(|w| w.len() > 3)
            .take(5)
            .collect();

        Ok(EnrichmentSuggestion {
            category,
            tags,
            summary: if description.is_empty() { title.to_string() } else { description.to_string() },
            keywords: title.split_whitespace().map(str::to_lowercase).collect(),
        })
    }
}

#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// A cheap hash-based vector: not semantically meaningful, but fixed-size
/// and stable per input, enough to exercise the Embedding agent end to end.
pub struct MockEmbeddingClient;

#[async_trait]
impl EmbeddingClient for MockEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; a2a_core::EMBEDDING_VECTOR_DIMENSIONS];
        for (i, byte) in text.bytes().enumerate() {
            let slot = i % vector.len();
            vector[slot] += (byte as f32) / 255.0;
        }
        Ok(vector)
    }
}

/// Extracted page metadata, shared between Validation's success path and
/// Enrichment's prompt construction.
#[derive(Debug, Clone, Default)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub author: Option<String>,
    pub og_image: Option<String>,
    pub favicon: Option<String>,
}

pub(crate) fn extract_metadata(html: &str) -> PageMetadata {
    use regex::Regex;

    fn capture(re: &str, haystack: &str) -> Option<String> {
        Regex::new(re).ok().and_then(|r| r.captures(haystack)).and_then(|c| c.get(1)).map(|m| m.as_str().trim().to_string())
    }

    PageMetadata {
        title: capture(r"(?is)<title[^>]*>(.*?)</title>", html),
        description: capture(r#"(?is)<meta\s+name=["']description["']\s+content=["'](.*?)["']"#, html),
        keywords: capture(r#"(?is)<meta\s+name=["']keywords["']\s+content=["'](.*?)["']"#, html),
        author: capture(r#"(?is)<meta\s+name=["']author["']\s+content=["'](.*?)["']"#, html),
        og_image: capture(r#"(?is)<meta\s+property=["']og:image["']\s+content=["'](.*?)["']"#, html),
        favicon: capture(r#"(?is)<link\s+rel=["']icon["']\s+href=["'](.*?)["']"#, html),
    }
}

/// The fixed error-page heuristics: any match marks a 2xx-status fetch as an
/// `ERROR_PAGE_DETECTED` validation failure anyway.
pub(crate) fn looks_like_error_page(html: &str) -> bool {
    const PATTERNS: &[&str] = &[
        "404 not found",
        "page not found",
        "access denied",
        "forbidden",
        "unauthorized",
        "this page could not be found",
        "site can.t be reached",
    ];
    let lower = html.to_lowercase();
    PATTERNS.iter().any(|p| lower.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_metadata_reads_title_and_og_tags() {
        let html = r#"<html><head><title>Hi</title><meta property="og:image" content="https://x/y.png"></head></html>"#;
        let meta = extract_metadata(html);
        assert_eq!(meta.title.as_deref(), Some("Hi"));
        assert_eq!(meta.og_image.as_deref(), Some("https://x/y.png"));
    }

    #[test]
    fn error_page_heuristic_matches_known_phrases() {
        assert!(looks_like_error_page("<h1>404 Not Found</h1>"));
        assert!(looks_like_error_page("Access Denied"));
        assert!(!looks_like_error_page("<h1>Welcome</h1>"));
    }
}
