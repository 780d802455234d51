//! Classifier boundary. An external language model labels the query with an
//! intent and slots; everything that can go wrong there (transport errors,
//! timeouts, prose instead of JSON) collapses to the `unknown` route.

pub mod cache;
pub mod gemini;
pub mod rules;

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ClassifyError;
use cache::ClassificationCache;

pub use gemini::GeminiClient;
pub use rules::{apply_overrides, RulesOnlyClassifier};

static JSON_OBJECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Untyped classifier output: an intent label and string slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub intent: String,
    pub slots: BTreeMap<String, String>,
}

impl Route {
    pub fn new(intent: impl Into<String>, slots: BTreeMap<String, String>) -> Self {
        Self {
            intent: intent.into(),
            slots,
        }
    }

    pub fn unknown() -> Self {
        Self::new("unknown", BTreeMap::new())
    }

    pub fn slot(&self, name: &str) -> Option<&str> {
        self.slots.get(name).map(String::as_str)
    }
}

/// Language-model adapter: returns the raw completion for a query.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Identifier folded into cache keys.
    fn model_id(&self) -> &str;

    async fn complete(&self, query: &str) -> Result<String, ClassifyError>;
}

/// Parse a model completion into a [`Route`]. The outermost `{...}` block is
/// used so surrounding prose or code fences do not matter. Slot values of any
/// JSON type are stringified; nulls are dropped.
pub fn parse_route(text: &str) -> Result<Route, ClassifyError> {
    let json = JSON_OBJECT
        .find(text)
        .map(|m| m.as_str())
        .unwrap_or_else(|| text.trim());
    let value: Value =
        serde_json::from_str(json).map_err(|e| ClassifyError::Format(e.to_string()))?;
    let Value::Object(mut object) = value else {
        return Err(ClassifyError::Format("expected a JSON object".into()));
    };

    let intent = match object.remove("intent") {
        Some(Value::String(s)) => s,
        _ => "unknown".to_string(),
    };
    let mut slots = BTreeMap::new();
    if let Some(Value::Object(raw_slots)) = object.remove("slots") {
        for (name, value) in raw_slots {
            let text = match value {
                Value::Null => continue,
                Value::String(s) => s,
                other => other.to_string(),
            };
            slots.insert(name, text);
        }
    }
    Ok(Route::new(intent, slots))
}

/// Classifier + cache + timeout. Always produces a route.
pub struct QueryRouter {
    classifier: Arc<dyn Classifier>,
    cache: Option<ClassificationCache>,
    timeout: Duration,
}

impl QueryRouter {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        cache: Option<ClassificationCache>,
        timeout: Duration,
    ) -> Self {
        Self {
            classifier,
            cache,
            timeout,
        }
    }

    pub async fn route(&self, query: &str) -> Route {
        let key = ClassificationCache::compute_key(self.classifier.model_id(), query);
        if let Some(hit) = self.cache.as_ref().and_then(|c| c.get(&key)) {
            debug!(intent = %hit.intent, "classification cache hit");
            return hit;
        }

        let completion = tokio::time::timeout(self.timeout, self.classifier.complete(query))
            .await
            .unwrap_or(Err(ClassifyError::Timeout));
        let parsed = completion.and_then(|text| {
            debug!(raw = %text, "classifier output");
            parse_route(&text)
        });

        match parsed {
            Ok(route) => {
                let route = apply_overrides(query, route);
                if let Some(cache) = &self.cache {
                    cache.insert(key, route.clone());
                }
                route
            }
            Err(e) => {
                warn!(error = %e, "classification failed, treating query as unknown");
                Route::unknown()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        reply: Result<&'static str, ()>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(reply: Result<&'static str, ()>) -> Self {
            Self {
                reply,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Classifier for Scripted {
        fn model_id(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _query: &str) -> Result<String, ClassifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.reply
                .map(str::to_string)
                .map_err(|_| ClassifyError::Api("boom".into()))
        }
    }

    #[test]
    fn parses_json_inside_prose_and_fences() {
        let route = parse_route(
            "Sure!\n```json\n{\"intent\": \"price_query\", \"slots\": {\"product\": \"lax\", \"qty\": 2, \"x\": null}}\n```",
        )
        .unwrap();
        assert_eq!(route.intent, "price_query");
        assert_eq!(route.slot("product"), Some("lax"));
        assert_eq!(route.slot("qty"), Some("2"));
        assert_eq!(route.slot("x"), None);
    }

    #[test]
    fn missing_intent_is_unknown_and_garbage_is_an_error() {
        assert_eq!(parse_route("{\"slots\": {}}").unwrap().intent, "unknown");
        assert!(matches!(parse_route("no json here"), Err(ClassifyError::Format(_))));
        assert!(matches!(parse_route("[1, 2]"), Err(ClassifyError::Format(_))));
    }

    #[tokio::test]
    async fn failures_degrade_to_unknown() {
        let router = QueryRouter::new(Arc::new(Scripted::new(Err(()))), None, Duration::from_secs(1));
        assert_eq!(router.route("price of lax").await, Route::unknown());

        let garbage = QueryRouter::new(
            Arc::new(Scripted::new(Ok("I think it is a price question"))),
            None,
            Duration::from_secs(1),
        );
        assert_eq!(garbage.route("price of lax").await, Route::unknown());
    }

    #[tokio::test]
    async fn slow_classifier_times_out_to_unknown() {
        let mut slow = Scripted::new(Ok(r#"{"intent": "price_query", "slots": {}}"#));
        slow.delay = Duration::from_millis(200);
        let router = QueryRouter::new(Arc::new(slow), None, Duration::from_millis(10));
        assert_eq!(router.route("price of lax").await, Route::unknown());
    }

    #[tokio::test]
    async fn successful_routes_are_cached() {
        let classifier = Arc::new(Scripted::new(Ok(
            r#"{"intent": "price_query", "slots": {"product": "lax"}}"#,
        )));
        let cache = ClassificationCache::new(8, Duration::from_secs(60));
        let router = QueryRouter::new(classifier.clone(), Some(cache), Duration::from_secs(1));

        let first = router.route("How much is lax?").await;
        let second = router.route("  how much IS lax? ").await;
        assert_eq!(first.intent, "price_query");
        assert_eq!(first, second);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
    }
}
