// Categorization Agent (4.6.4): confidence-scored taxonomy matching. Weights
// are named constants per-field rather than scattered magic numbers, per the
// fixed scoring contract this agent must not silently re-tune.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use a2a_core::{Agent, AgentCapabilityCard, AgentContext, AgentOutcome, Error, Result, DEFAULT_CATEGORIES};

use crate::bookmarks::{Bookmark, BookmarkStore, Category};

/// Direct match between the AI-suggested category and one of the user's
/// existing categories (case-insensitive exact name match).
const WEIGHT_DIRECT_AI_MATCH: f64 = 0.5;
/// The AI suggestion names a category whose name is a substring of, or
/// contains, an existing category name.
const WEIGHT_PARTIAL_MATCH: f64 = 0.3;
/// Scaled by the fraction of the bookmark's tags that appear in the
/// category's name, capped at this weight.
const WEIGHT_TAG_OVERLAP_MAX: f64 = 0.3;
const WEIGHT_URL_PATTERN_MATCH: f64 = 0.2;
const WEIGHT_TITLE_KEYWORD_MATCH: f64 = 0.1;

/// Custom user-defined rules short-circuit the weighted scoring entirely.
const CONFIDENCE_CUSTOM_URL_RULE: f64 = 0.9;
const CONFIDENCE_CUSTOM_TAG_RULE: f64 = 0.85;
const CONFIDENCE_AI_FALLBACK_CREATE: f64 = 0.7;
const CONFIDENCE_OTHER_FALLBACK: f64 = 0.3;
const MIN_CONFIDENCE_TO_ACCEPT_BEST_MATCH: f64 = 0.5;

const OTHER_CATEGORY: &str = "Other";

#[derive(Debug, Deserialize)]
struct CategorizationInput {
    #[serde(rename = "bookmarkIds")]
    bookmark_ids: Vec<String>,
    #[serde(rename = "userId")]
    user_id: String,
    #[serde(rename = "categoryMapping", default)]
    category_mapping: CategoryMapping,
}

#[derive(Debug, Default, Deserialize)]
struct CategoryMapping {
    #[serde(default)]
    url_patterns: HashMap<String, String>,
    #[serde(default)]
    tag_rules: HashMap<String, String>,
}

fn parse_input(ctx: &AgentContext<'_>) -> Result<CategorizationInput> {
    serde_json::from_value(Value::Object(ctx.task.context.clone()))
        .map_err(|e| Error::validation(format!("missing required categorization inputs: {e}")))
}

#[derive(Debug, Clone, serde::Serialize)]
struct CategorizationItemResult {
    #[serde(rename = "bookmarkId")]
    bookmark_id: String,
    #[serde(rename = "categoryId")]
    category_id: String,
    #[serde(rename = "categoryName")]
    category_name: String,
    confidence: f64,
    reason: String,
}

fn normalized_eq(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

fn score_category(category: &Category, bookmark: &Bookmark, ai_category: Option<&str>) -> f64 {
    let mut score = 0.0;

    if let Some(ai_cat) = ai_category {
        if normalized_eq(ai_cat, &category.name) {
            score += WEIGHT_DIRECT_AI_MATCH;
        } else {
            let ai_lower = ai_cat.to_lowercase();
            let cat_lower = category.name.to_lowercase();
            if ai_lower.contains(&cat_lower) || cat_lower.contains(&ai_lower) {
                score += WEIGHT_PARTIAL_MATCH;
            }
        }
    }

    if !bookmark.ai_tags.is_empty() {
        let cat_lower = category.name.to_lowercase();
        let matching = bookmark.ai_tags.iter().filter(|t| cat_lower.contains(&t.to_lowercase())).count();
        let fraction = matching as f64 / bookmark.ai_tags.len() as f64;
        score += fraction * WEIGHT_TAG_OVERLAP_MAX;
    }

    let url_lower = bookmark.url.to_lowercase();
    let cat_lower = category.name.to_lowercase();
    if url_lower.contains(&cat_lower) {
        score += WEIGHT_URL_PATTERN_MATCH;
    }

    let title_lower = bookmark.title.to_lowercase();
    if title_lower.contains(&cat_lower) {
        score += WEIGHT_TITLE_KEYWORD_MATCH;
    }

    score
}

pub struct CategorizationAgent {
    card: AgentCapabilityCard,
    store: Arc<dyn BookmarkStore>,
}

impl CategorizationAgent {
    pub fn new(store: Arc<dyn BookmarkStore>) -> Self {
        let card = AgentCapabilityCard::builder("categorization", a2a_core::artifact_types::CATEGORIZATION_RESULT)
            .description("Assigns each bookmark to a category via confidence-scored taxonomy matching")
            .input("bookmarkIds", "array", true)
            .input("userId", "string", true)
            .output_field("categorizedCount", "integer")
            .output_field("failedCount", "integer")
            .build();
        Self { card, store }
    }

    fn ai_category_of(bookmark: &Bookmark) -> Option<String> {
        bookmark.enrichment_data.get("suggestedCategory").and_then(Value::as_str).map(str::to_string)
    }

    fn custom_rule_match(bookmark: &Bookmark, mapping: &CategoryMapping) -> Option<(String, f64, &'static str)> {
        for (pattern, category_name) in &mapping.url_patterns {
            if bookmark.url.to_lowercase().contains(&pattern.to_lowercase()) {
                return Some((category_name.clone(), CONFIDENCE_CUSTOM_URL_RULE, "custom_url_rule"));
            }
        }
        for (tag_pattern, category_name) in &mapping.tag_rules {
            if bookmark.ai_tags.iter().any(|t| t.eq_ignore_ascii_case(tag_pattern)) {
                return Some((category_name.clone(), CONFIDENCE_CUSTOM_TAG_RULE, "custom_tag_rule"));
            }
        }
        None
    }
}

#[async_trait]
impl Agent for CategorizationAgent {
    fn capabilities(&self) -> &AgentCapabilityCard {
        &self.card
    }

    fn validate(&self, ctx: &AgentContext<'_>) -> Result<()> {
        parse_input(ctx).map(|_| ())
    }

    async fn process(&self, ctx: &AgentContext<'_>) -> Result<AgentOutcome> {
        let input = parse_input(ctx)?;
        self.store.seed_default_taxonomy(&input.user_id).await?;
        let categories = self.store.categories_for_user(&input.user_id).await?;
        let bookmarks = self.store.get_many(&input.user_id, &input.bookmark_ids).await?;
        let total = bookmarks.len();

        let mut category_distribution: HashMap<String, usize> = HashMap::new();
        let mut item_results = Vec::with_capacity(total);
        let mut categorized_count = 0usize;
        let mut failed_count = 0usize;

        for (i, bookmark) in bookmarks.iter().enumerate() {
            if ctx.is_cancelled() {
                return Ok(AgentOutcome::Failed { error: "cancelled during categorization".into() });
            }

            let chosen = if let Some((name, confidence, reason)) = Self::custom_rule_match(bookmark, &input.category_mapping) {
                let category = self.store.find_or_create_category(&input.user_id, &name).await?;
                Some((category, confidence, reason))
            } else {
                let ai_category = Self::ai_category_of(bookmark);
                let best = categories
                    .iter()
                    .map(|c| (c, score_category(c, bookmark, ai_category.as_deref())))
                    .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

                match best {
                    Some((category, score)) if score >= MIN_CONFIDENCE_TO_ACCEPT_BEST_MATCH => {
                        Some((category.clone(), score, "scored_match"))
                    }
                    _ => {
                        if let Some(ai_cat) = ai_category.filter(|c| DEFAULT_CATEGORIES.iter().any(|d| normalized_eq(d, c))) {
                            let category = self.store.find_or_create_category(&input.user_id, &ai_cat).await?;
                            Some((category, CONFIDENCE_AI_FALLBACK_CREATE, "ai_fallback_create"))
                        } else {
                            let category = self.store.find_or_create_category(&input.user_id, OTHER_CATEGORY).await?;
                            Some((category, CONFIDENCE_OTHER_FALLBACK, "other_fallback"))
                        }
                    }
                }
            };

            match chosen {
                Some((category, confidence, reason)) => {
                    let data = json!({"confidence": confidence, "method": reason});
                    let data_map = match data {
                        Value::Object(map) => map,
                        _ => Map::new(),
                    };
                    if let Err(err) = self.store.update_categorization(&bookmark.id, category.id.clone(), data_map).await {
                        tracing::warn!(bookmark_id = %bookmark.id, error = %err, "categorization DB update failed; result still counted");
                    }
                    *category_distribution.entry(category.name.clone()).or_insert(0) += 1;
                    categorized_count += 1;
                    item_results.push(CategorizationItemResult {
                        bookmark_id: bookmark.id.clone(),
                        category_id: category.id,
                        category_name: category.name,
                        confidence,
                        reason: reason.to_string(),
                    });
                }
                None => failed_count += 1,
            }

            let n = i + 1;
            if n % 5 == 0 || n == total {
                let pct = 10 + ((85 * n) / total.max(1)).min(85);
                ctx.report_progress(pct as u8, &format!("categorized {n}/{total}"));
            }
        }

        ctx.report_progress(100, "categorization complete");

        Ok(AgentOutcome::Completed {
            artifact_type: a2a_core::artifact_types::CATEGORIZATION_RESULT.to_string(),
            data: json!({
                "categorizedCount": categorized_count,
                "failedCount": failed_count,
                "categorizationResults": item_results,
                "categoryDistribution": category_distribution,
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
        a2a_core::Task::new("bookmark_workflow", "quick_import", vec!["categorization".into()], "u1", map, Map::new())
    }

    #[tokio::test]
    async fn direct_ai_category_match_wins_over_other_fallback() {
        let store = Arc::new(InMemoryBookmarkStore::new());
        let (bm, _) = store.insert_or_update("u1", "https://rust-lang.org", "The Rust Language").await.unwrap();
        store
            .update_enrichment(&bm.id, vec!["rust".into(), "language".into()], "A systems language".into(), {
                let mut m = Map::new();
                m.insert("suggestedCategory".into(), json!("Development"));
                m
            })
            .await
            .unwrap();

        let agent = CategorizationAgent::new(store.clone());
        let task = task_with(json!({"bookmarkIds": [bm.id.clone()], "userId": "u1"}));
        let ctx = AgentContext::new(&task, |_, _| {}, || false);
        let outcome = agent.process(&ctx).await.unwrap();
        let AgentOutcome::Completed { data, .. } = outcome else { panic!("expected completed") };
        assert_eq!(data["categorizedCount"], 1);

        let reloaded = store.get_many("u1", &[bm.id]).await.unwrap();
        let categories = store.categories_for_user("u1").await.unwrap();
        let assigned = categories.iter().find(|c| Some(c.id.clone()) == reloaded[0].category_id).unwrap();
        assert_eq!(assigned.name, "Development");
    }

    #[tokio::test]
    async fn custom_url_rule_short_circuits_scoring() {
        let store = Arc::new(InMemoryBookmarkStore::new());
        let (bm, _) = store.insert_or_update("u1", "https://internal.corp/wiki", "Wiki").await.unwrap();

        let agent = CategorizationAgent::new(store.clone());
        let task = task_with(json!({
            "bookmarkIds": [bm.id.clone()],
            "userId": "u1",
            "categoryMapping": {"url_patterns": {"internal.corp": "Work"}},
        }));
        let ctx = AgentContext::new(&task, |_, _| {}, || false);
        let outcome = agent.process(&ctx).await.unwrap();
        let AgentOutcome::Completed { data, .. } = outcome else { panic!("expected completed") };
        let first = &data["categorizationResults"][0];
        assert_eq!(first["categoryName"], "Work");
        assert_eq!(first["confidence"], CONFIDENCE_CUSTOM_URL_RULE);
    }

    #[tokio::test]
    async fn unmatched_bookmark_falls_back_to_other() {
        let store = Arc::new(InMemoryBookmarkStore::new());
        let (bm, _) = store.insert_or_update("u1", "https://random-site.test", "xyz").await.unwrap();

        let agent = CategorizationAgent::new(store.clone());
        let task = task_with(json!({"bookmarkIds": [bm.id], "userId": "u1"}));
        let ctx = AgentContext::new(&task, |_, _| {}, || false);
        let outcome = agent.process(&ctx).await.unwrap();
        let AgentOutcome::Completed { data, .. } = outcome else { panic!("expected completed") };
        assert_eq!(data["categorizationResults"][0]["categoryName"], "Other");
        assert_eq!(data["categorizationResults"][0]["confidence"], CONFIDENCE_OTHER_FALLBACK);
    }
}
