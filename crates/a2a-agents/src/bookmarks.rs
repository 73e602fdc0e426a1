// Bookmark rows are "referenced, not owned" by the A2A core: every concrete
// agent reads and writes them, but the relational schema backing them is an
// external collaborator. `BookmarkStore` is that collaborator's pluggable
// boundary, mirroring the `UrlFetcher`/`AiClient`/`EmbeddingClient` shape in
// `capability.rs`. `InMemoryBookmarkStore` is the mock every agent test runs
// against.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

use a2a_core::{Error, Result, DEFAULT_CATEGORIES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookmarkStatus {
    Imported,
    Validated,
    Enriched,
    Failed,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub user_id: String,
    pub url: String,
    pub title: String,
    pub description: String,
    pub status: BookmarkStatus,
    pub is_valid: Option<bool>,
    pub last_validated_at: Option<DateTime<Utc>>,
    pub validation_errors: Vec<String>,
    pub ai_tags: Vec<String>,
    pub ai_summary: Option<String>,
    pub enrichment_data: Map<String, Value>,
    pub category_id: Option<String>,
    pub categorization_data: Map<String, Value>,
    pub embedding: Option<Vec<f32>>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

#[async_trait]
pub trait BookmarkStore: Send + Sync {
    /// Inserts a new bookmark, or on a `(user_id, url)` conflict updates its
    /// title and returns the existing row with `was_duplicate=true`.
    async fn insert_or_update(&self, user_id: &str, url: &str, title: &str) -> Result<(Bookmark, bool)>;

    async fn get_many(&self, user_id: &str, ids: &[String]) -> Result<Vec<Bookmark>>;

    async fn update_validation(
        &self,
        id: &str,
        is_valid: bool,
        errors: Vec<String>,
        metadata: Map<String, Value>,
    ) -> Result<()>;

    async fn update_enrichment(&self, id: &str, tags: Vec<String>, summary: String, data: Map<String, Value>) -> Result<()>;

    async fn update_categorization(&self, id: &str, category_id: String, data: Map<String, Value>) -> Result<()>;

    async fn update_embedding(&self, id: &str, vector: Vec<f32>) -> Result<()>;

    async fn categories_for_user(&self, user_id: &str) -> Result<Vec<Category>>;

    async fn find_or_create_category(&self, user_id: &str, name: &str) -> Result<Category>;

    /// Idempotent: a user who already has any categories is left untouched.
    async fn seed_default_taxonomy(&self, user_id: &str) -> Result<()>;
}

const TAXONOMY_COLORS: &[&str] = &[
    "#4F46E5", "#059669", "#2563EB", "#D97706", "#7C3AED", "#DC2626", "#DB2777", "#0891B2", "#65A30D", "#64748B", "#6B7280",
];

#[derive(Default)]
pub struct InMemoryBookmarkStore {
    bookmarks: DashMap<String, Bookmark>,
    by_user_url: DashMap<(String, String), String>,
    categories: DashMap<String, Category>,
}

impl InMemoryBookmarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl BookmarkStore for InMemoryBookmarkStore {
    async fn insert_or_update(&self, user_id: &str, url: &str, title: &str) -> Result<(Bookmark, bool)> {
        let key = (user_id.to_string(), url.to_string());
        if let Some(existing_id) = self.by_user_url.get(&key).map(|e| e.value().clone()) {
            let mut entry = self.bookmarks.get_mut(&existing_id).ok_or_else(|| Error::internal("dangling bookmark index"))?;
            entry.title = title.to_string();
            entry.updated = Utc::now();
            return Ok((entry.clone(), true));
        }

        let now = Utc::now();
        let bookmark = Bookmark {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            url: url.to_string(),
            title: title.to_string(),
            description: String::new(),
            status: BookmarkStatus::Imported,
            is_valid: None,
            last_validated_at: None,
            validation_errors: Vec::new(),
            ai_tags: Vec::new(),
            ai_summary: None,
            enrichment_data: Map::new(),
            category_id: None,
            categorization_data: Map::new(),
            embedding: None,
            created: now,
            updated: now,
        };
        self.by_user_url.insert(key, bookmark.id.clone());
        self.bookmarks.insert(bookmark.id.clone(), bookmark.clone());
        Ok((bookmark, false))
    }

    async fn get_many(&self, user_id: &str, ids: &[String]) -> Result<Vec<Bookmark>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.bookmarks.get(id))
            .filter(|b| b.user_id == user_id)
            .map(|b| b.clone())
            .collect())
    }

    async fn update_validation(&self, id: &str, is_valid: bool, errors: Vec<String>, metadata: Map<String, Value>) -> Result<()> {
        let mut entry = self.bookmarks.get_mut(id).ok_or_else(|| Error::not_found(format!("bookmark '{id}'")))?;
        entry.is_valid = Some(is_valid);
        entry.last_validated_at = Some(Utc::now());
        entry.validation_errors = errors;
        if is_valid {
            entry.status = BookmarkStatus::Validated;
        }
        if let Some(title) = metadata.get("title").and_then(Value::as_str) {
            if !title.is_empty() {
                entry.title = title.to_string();
            }
        }
        if let Some(description) = metadata.get("description").and_then(Value::as_str) {
            entry.description = description.to_string();
        }
        entry.updated = Utc::now();
        Ok(())
    }

    async fn update_enrichment(&self, id: &str, tags: Vec<String>, summary: String, data: Map<String, Value>) -> Result<()> {
        let mut entry = self.bookmarks.get_mut(id).ok_or_else(|| Error::not_found(format!("bookmark '{id}'")))?;
        entry.ai_tags = tags;
        entry.ai_summary = Some(summary);
        entry.enrichment_data = data;
        entry.status = BookmarkStatus::Enriched;
        entry.updated = Utc::now();
        Ok(())
    }

    async fn update_categorization(&self, id: &str, category_id: String, data: Map<String, Value>) -> Result<()> {
        let mut entry = self.bookmarks.get_mut(id).ok_or_else(|| Error::not_found(format!("bookmark '{id}'")))?;
        entry.category_id = Some(category_id);
        entry.categorization_data = data;
        entry.updated = Utc::now();
        Ok(())
    }

    async fn update_embedding(&self, id: &str, vector: Vec<f32>) -> Result<()> {
        let mut entry = self.bookmarks.get_mut(id).ok_or_else(|| Error::not_found(format!("bookmark '{id}'")))?;
        entry.embedding = Some(vector);
        entry.updated = Utc::now();
        Ok(())
    }

    async fn categories_for_user(&self, user_id: &str) -> Result<Vec<Category>> {
        Ok(self.categories.iter().filter(|e| e.value().user_id == user_id).map(|e| e.value().clone()).collect())
    }

    async fn find_or_create_category(&self, user_id: &str, name: &str) -> Result<Category> {
        if let Some(existing) = self.categories.iter().find(|e| e.value().user_id == user_id && e.value().name == name) {
            return Ok(existing.value().clone());
        }
        let color = TAXONOMY_COLORS[self.categories.len() % TAXONOMY_COLORS.len()].to_string();
        let category = Category { id: Uuid::new_v4().to_string(), user_id: user_id.to_string(), name: name.to_string(), color };
        self.categories.insert(category.id.clone(), category.clone());
        Ok(category)
    }

    async fn seed_default_taxonomy(&self, user_id: &str) -> Result<()> {
        if self.categories.iter().any(|e| e.value().user_id == user_id) {
            return Ok(());
        }
        for name in DEFAULT_CATEGORIES {
            self.find_or_create_category(user_id, name).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_then_reinsert_same_url_is_a_duplicate() {
        let store = InMemoryBookmarkStore::new();
        let (first, dup1) = store.insert_or_update("u1", "https://a.test", "Old title").await.unwrap();
        assert!(!dup1);
        let (second, dup2) = store.insert_or_update("u1", "https://a.test", "New title").await.unwrap();
        assert!(dup2);
        assert_eq!(first.id, second.id);
        assert_eq!(second.title, "New title");
    }

    #[tokio::test]
    async fn seed_default_taxonomy_is_idempotent() {
        let store = InMemoryBookmarkStore::new();
        store.seed_default_taxonomy("u1").await.unwrap();
        store.seed_default_taxonomy("u1").await.unwrap();
        let categories = store.categories_for_user("u1").await.unwrap();
        assert_eq!(categories.len(), DEFAULT_CATEGORIES.len());
    }
}
