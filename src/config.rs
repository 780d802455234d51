//! Runtime configuration. The binary fills this from CLI flags / environment;
//! tests use [`AppConfig::default`].

use std::path::PathBuf;
use std::time::Duration;

use crate::classify::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding `hemkop_*.json`, `ica_*.csv` and `ica_*.json`.
    pub data_dir: PathBuf,
    pub recipes_path: PathBuf,
    /// Extra English → market term pairs; built-in pairs are always present.
    pub glossary_path: Option<PathBuf>,
    /// Without a key the service routes with the rules-only classifier.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    /// Upper bound on one classification, retries included.
    pub classify_timeout: Duration,
    /// 0 disables the classification cache.
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            recipes_path: PathBuf::from("recipes.csv"),
            glossary_path: None,
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            classify_timeout: Duration::from_secs(20),
            cache_capacity: 256,
            cache_ttl: Duration::from_secs(600),
        }
    }
}
