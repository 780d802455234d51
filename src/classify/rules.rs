//! Deterministic corrections applied on top of the model's route, plus a
//! rules-only classifier for running without model credentials.

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::{Classifier, Route};
use crate::error::ClassifyError;

/// Phrases that turn any query into a recipe-detail request.
const DETAIL_TRIGGERS: &[&str] = &["show", "details", "more info", "how to make", "recipe for", "get info"];
/// Phrases after which the recipe title starts, tried in order.
const DETAIL_SPLITTERS: &[&str] = &[
    "show",
    "details",
    "more info about",
    "get info about",
    "how to make",
    "recipe for",
];
const DETAIL_PREFIXES: &[&str] = &["show ", "open ", "details ", "view "];

/// Correct a parsed route using the query text:
/// detail phrasing forces `recipe_detail` with the trailing title, and a
/// `recipe_query` whose ingredient does not occur in the query falls back to
/// the query's last alphabetic word.
pub fn apply_overrides(query: &str, mut route: Route) -> Route {
    let q = query.trim().to_lowercase();

    if DETAIL_TRIGGERS.iter().any(|kw| q.contains(kw)) {
        let title = DETAIL_SPLITTERS
            .iter()
            .find_map(|kw| q.split_once(kw).map(|(_, tail)| tail.trim()))
            .unwrap_or(q.as_str());
        route = recipe_detail(title);
    }

    if DETAIL_PREFIXES.iter().any(|p| q.starts_with(p)) {
        if let Some((_, tail)) = q.split_once(' ') {
            route = recipe_detail(tail.trim_matches(|c| c == '"' || c == ' '));
        }
    }

    if route.intent == "recipe_query" {
        let mentioned = route
            .slot("ingredient")
            .is_some_and(|i| !i.is_empty() && q.contains(&i.to_lowercase()));
        if !mentioned {
            let fallback = q
                .split_whitespace()
                .filter(|w| w.chars().all(char::is_alphabetic))
                .last()
                .unwrap_or("ingredient");
            route.slots.insert("ingredient".to_string(), fallback.to_string());
        }
    }

    route
}

fn recipe_detail(title: &str) -> Route {
    let mut slots = BTreeMap::new();
    slots.insert("recipe_title".to_string(), title.to_string());
    Route::new("recipe_detail", slots)
}

/// Stand-in used when no model is configured: every query is `unknown`
/// before the rule overrides run.
pub struct RulesOnlyClassifier;

#[async_trait]
impl Classifier for RulesOnlyClassifier {
    fn model_id(&self) -> &str {
        "rules-only"
    }

    async fn complete(&self, _query: &str) -> Result<String, ClassifyError> {
        Ok(r#"{"intent": "unknown", "slots": {}}"#.to_string())
    }
}
