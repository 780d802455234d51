//! Request pipeline: classify the query, convert the route into a typed
//! intent, compose the answer.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, info_span, Instrument};

use crate::catalog::CatalogStore;
use crate::classify::{QueryRouter, Route};
use crate::compose::{AnswerComposer, Intent, IntentKind};
use crate::metrics::{MetricsRegistry, RequestId, Stage};
use crate::recipes::RecipeStore;
use crate::text::TermMap;

/// Response of one query: the intent acted on, the answer text and the slots
/// the classifier extracted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AskResponse {
    pub intent: IntentKind,
    pub answer: String,
    pub slots: BTreeMap<String, String>,
}

/// Read-only stores shared by every request.
pub struct Stores {
    pub catalog: CatalogStore,
    pub recipes: RecipeStore,
    pub terms: TermMap,
}

pub struct AskService {
    stores: Arc<Stores>,
    router: QueryRouter,
    metrics: Arc<MetricsRegistry>,
}

impl AskService {
    pub fn new(stores: Arc<Stores>, router: QueryRouter, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            stores,
            router,
            metrics,
        }
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn composer(&self) -> AnswerComposer<'_> {
        AnswerComposer::new(&self.stores.catalog, &self.stores.recipes, &self.stores.terms)
    }

    pub async fn ask(&self, query: &str) -> AskResponse {
        let request_id = RequestId::new();
        let span = info_span!("ask", %request_id);
        async {
            let total = self.metrics.start(Stage::Request);

            let timing = self.metrics.start(Stage::Classify);
            let route = self.router.route(query).await;
            timing.stop();

            let response = self.answer_route(route);
            let elapsed_us = total.stop().as_micros() as u64;
            info!(intent = %response.intent, elapsed_us, "query answered");
            response
        }
        .instrument(span)
        .await
    }

    /// Answer an already-classified route.
    pub fn answer_route(&self, route: Route) -> AskResponse {
        let timing = self.metrics.start(Stage::Compose);
        let intent = Intent::from_route(&route);
        let answer = self.composer().answer(&intent);
        timing.stop();
        AskResponse {
            intent: intent.kind(),
            answer,
            slots: route.slots,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Product, Store};
    use crate::classify::RulesOnlyClassifier;
    use crate::recipes::RecipeRecord;
    use std::time::Duration;

    fn service() -> AskService {
        let stores = Stores {
            catalog: CatalogStore::from_products(vec![
                Product::new("Lax Filé", Store::Hemkop).with_price("99")
            ]),
            recipes: RecipeStore::from_records(vec![RecipeRecord {
                title: "Lentil Burgers".into(),
                ingredients_raw: "['lentils']".into(),
                instructions_raw: "Mix. Fry.".into(),
                ..Default::default()
            }]),
            terms: TermMap::builtin(),
        };
        let router = QueryRouter::new(Arc::new(RulesOnlyClassifier), None, Duration::from_secs(1));
        AskService::new(Arc::new(stores), router, Arc::new(MetricsRegistry::new()))
    }

    #[tokio::test]
    async fn rules_only_routes_detail_requests() {
        let service = service();
        let response = service.ask("show lentil burgers").await;
        assert_eq!(response.intent, IntentKind::RecipeDetail);
        assert_eq!(response.slots.get("recipe_title").map(String::as_str), Some("lentil burgers"));
        assert!(response.answer.starts_with("Lentil Burgers\n"));
        assert_eq!(service.metrics().summary()[Stage::Request.metric_name()].count, 1);
    }

    #[tokio::test]
    async fn unclassified_queries_get_generic_answer() {
        let response = service().ask("hello there").await;
        assert_eq!(response.intent, IntentKind::Unknown);
        assert_eq!(response.answer, crate::compose::UNKNOWN_ANSWER);
        assert!(response.slots.is_empty());
    }

    #[test]
    fn unrecognized_label_reports_unknown() {
        let response = service().answer_route(Route::new("weather", BTreeMap::new()));
        assert_eq!(response.intent, IntentKind::Unknown);
    }

    #[test]
    fn price_route_answers_with_translation() {
        let mut slots = BTreeMap::new();
        slots.insert("product".to_string(), "salmon".to_string());
        let response = service().answer_route(Route::new("price_query", slots));
        assert_eq!(response.answer, "Lax Filé costs 99 (Hemköp)");
        assert_eq!(response.slots.get("product").map(String::as_str), Some("salmon"));
    }
}
