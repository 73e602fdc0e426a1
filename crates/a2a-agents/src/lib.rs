// a2a-agents - the five concrete agents (Import, Validation, Enrichment,
// Categorization, Embedding) plus the pluggable external-capability traits
// they depend on: URL fetching, an AI completion client, and an embedding
// client. Each trait ships an in-process mock so the pipeline runs with zero
// external services configured; `http-fetcher` swaps in a real reqwest-backed
// fetcher for the Validation agent.

pub mod bookmarks;
pub mod capability;
pub mod categorization;
pub mod embedding;
pub mod enrichment;
pub mod import;
pub mod validation;

pub use bookmarks::{Bookmark, BookmarkStatus, BookmarkStore, Category, InMemoryBookmarkStore};
pub use capability::{AiClient, EmbeddingClient, FetchOutcome, MockAiClient, MockEmbeddingClient, MockUrlFetcher, UrlFetcher};
pub use categorization::CategorizationAgent;
pub use embedding::EmbeddingAgent;
pub use enrichment::EnrichmentAgent;
pub use import::ImportAgent;
pub use validation::ValidationAgent;

#[cfg(feature = "http-fetcher")]
pub use validation::ReqwestUrlFetcher;
