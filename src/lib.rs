//! SmartRecipe: answers grocery and recipe questions over local product and
//! recipe catalogs. A language model labels each query with an intent; the
//! resolvers and composer here turn that intent into an answer.

pub mod catalog;
pub mod classify;
pub mod compose;
pub mod config;
pub mod error;
pub mod metrics;
pub mod present;
pub mod recipes;
pub mod resolve;
pub mod server;
pub mod service;
pub mod text;

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use catalog::loader::load_catalog;
use classify::cache::ClassificationCache;
use classify::{Classifier, GeminiClient, QueryRouter, RulesOnlyClassifier};
use config::AppConfig;
use metrics::MetricsRegistry;
use recipes::loader::load_recipes;
use service::{AskService, Stores};
use text::TermMap;

const DEFAULT_LOG_FILTER: &str = "smartrecipe=debug,tower_http=info";

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

/// Load the stores and wire up the classifier described by `config`.
/// Missing data files yield empty stores; a missing API key falls back to
/// the rules-only classifier.
pub fn build_service(config: &AppConfig) -> AskService {
    let catalog = load_catalog(&config.data_dir);
    let recipes = load_recipes(&config.recipes_path);

    let terms = match &config.glossary_path {
        Some(path) => TermMap::load_from_file(path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "glossary load failed, using built-in terms");
            TermMap::builtin()
        }),
        None => TermMap::builtin(),
    };

    let classifier = build_classifier(config);
    let cache = (config.cache_capacity > 0)
        .then(|| ClassificationCache::new(config.cache_capacity, config.cache_ttl));
    let router = QueryRouter::new(classifier, cache, config.classify_timeout);

    AskService::new(
        Arc::new(Stores {
            catalog,
            recipes,
            terms,
        }),
        router,
        Arc::new(MetricsRegistry::new()),
    )
}

fn build_classifier(config: &AppConfig) -> Arc<dyn Classifier> {
    let Some(api_key) = config.api_key.clone() else {
        warn!("no classifier API key configured, routing with rules only");
        return Arc::new(RulesOnlyClassifier);
    };
    match GeminiClient::new(
        api_key,
        config.base_url.clone(),
        config.model.clone(),
        config.classify_timeout,
    ) {
        Ok(client) => {
            info!(model = %config.model, "Gemini classifier initialized");
            Arc::new(client)
        }
        Err(e) => {
            warn!(error = %e, "Gemini client init failed, routing with rules only");
            Arc::new(RulesOnlyClassifier)
        }
    }
}
