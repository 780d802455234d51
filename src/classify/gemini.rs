//! Gemini `generateContent` client used as the intent classifier.
//! Connection pooling via reqwest, a minimum interval between requests,
//! and bounded retries on 429 / 5xx / timeout.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use super::Classifier;
use crate::error::ClassifyError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const PROMPT_HEADER: &str = r#"You are a strict JSON generator.

Classify food-related questions into one of these intents:
1. "product_nutrient" - nutrient values of a product (protein, calories, ...)
2. "price_query" - cost or price of a product
3. "recipe_query" - a list of recipes using an ingredient
4. "recipe_detail" - full details of a specific recipe
5. "meal_recommendation" - meals with dietary preferences (vegan, vegetarian, pescatarian, meat, high protein, low carb)
6. "unknown" - everything else

Extract slots:
- meal_recommendation: diet, nutrient, level (high or low), meal_type (optional: breakfast, lunch, dinner)
- recipe_query: ingredient
- recipe_detail: recipe_title
- product_nutrient: product, nutrient
- price_query: product

Return only JSON, no text.

Examples:
{"intent": "meal_recommendation", "slots": {"diet": "vegan", "nutrient": "protein", "level": "high"}}
{"intent": "product_nutrient", "slots": {"product": "Kycklingkebab Fryst", "nutrient": "protein"}}
{"intent": "price_query", "slots": {"product": "Kyckling Lårfilé"}}
{"intent": "unknown", "slots": {}}
"#;

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    next_allowed: tokio::sync::Mutex<Instant>,
    min_interval: Duration,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        request_timeout: Duration,
    ) -> Result<Self, ClassifyError> {
        if api_key.trim().is_empty() {
            return Err(ClassifyError::InvalidInput("Gemini API key is empty".into()));
        }
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(request_timeout)
            .build()
            .map_err(|e| ClassifyError::Api(e.to_string()))?;

        let model = model.trim_start_matches("models/").to_string();
        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            next_allowed: tokio::sync::Mutex::new(Instant::now()),
            min_interval: Duration::from_millis(100),
        })
    }

    async fn rate_limit_wait(&self) {
        let mut next = self.next_allowed.lock().await;
        let now = Instant::now();
        if *next > now {
            tokio::time::sleep(*next - now).await;
        }
        *next = Instant::now() + self.min_interval;
    }

    /// 429: Retry-After or 1s/2s/4s (max 3).
    /// 5xx: exponential backoff (max 2).
    /// Timeout: immediate retry once.
    async fn send_with_retry(
        &self,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, ClassifyError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let mut attempt: u32 = 0;
        let max_429_retries: u32 = 3;
        let max_5xx_retries: u32 = 2;
        let mut timeout_retried = false;

        loop {
            let result = self
                .http
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(body)
                .send()
                .await;

            match result {
                Ok(resp) if resp.status().is_success() => return Ok(resp),
                Ok(resp) if resp.status().as_u16() == 429 => {
                    if attempt >= max_429_retries {
                        return Err(ClassifyError::RateLimited { retry_after_ms: 0 });
                    }
                    let wait = resp
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .map(Duration::from_secs)
                        .unwrap_or_else(|| Duration::from_secs(1 << attempt));
                    warn!(attempt, wait_ms = wait.as_millis() as u64, "429 rate limited, retrying");
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Ok(resp) if resp.status().is_server_error() => {
                    if attempt >= max_5xx_retries {
                        return Err(ClassifyError::Api(format!("server error: {}", resp.status())));
                    }
                    let wait = Duration::from_millis(500 * (1 << attempt));
                    warn!(
                        attempt,
                        status = resp.status().as_u16(),
                        wait_ms = wait.as_millis() as u64,
                        "5xx error, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Ok(resp) => {
                    let status = resp.status();
                    let body_text = resp.text().await.unwrap_or_default();
                    return Err(ClassifyError::Api(format!(
                        "unexpected status {}: {}",
                        status,
                        body_text.chars().take(200).collect::<String>()
                    )));
                }
                Err(e) if e.is_timeout() => {
                    if timeout_retried {
                        return Err(ClassifyError::Timeout);
                    }
                    warn!("request timeout, retrying once");
                    timeout_retried = true;
                }
                Err(e) => return Err(ClassifyError::Api(e.to_string())),
            }
        }
    }
}

#[async_trait]
impl Classifier for GeminiClient {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, query: &str) -> Result<String, ClassifyError> {
        self.rate_limit_wait().await;

        let body = serde_json::json!({
            "contents": [{"role": "user", "parts": [{"text": build_prompt(query)}]}],
            "generationConfig": {"temperature": 0.0, "responseMimeType": "application/json"}
        });
        let response = self.send_with_retry(&body).await?;
        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ClassifyError::Api(e.to_string()))?;
        parsed
            .text()
            .ok_or_else(|| ClassifyError::Format("response has no text candidate".into()))
    }
}

fn build_prompt(query: &str) -> String {
    // The query is embedded as a JSON string so quotes cannot break the prompt.
    let quoted = serde_json::Value::String(query.to_string()).to_string();
    format!("{PROMPT_HEADER}\nQuery: {quoted}\n")
}

// --- Response types ---

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_quotes_the_query() {
        let prompt = build_prompt(r#"what's "lax" cost?"#);
        assert!(prompt.starts_with("You are a strict JSON generator."));
        assert!(prompt.ends_with("Query: \"what's \\\"lax\\\" cost?\"\n"));
    }

    #[test]
    fn extracts_candidate_text() {
        let raw = r#"{"candidates": [{"content": {"parts": [{"text": "{\"intent\": "}, {"text": "\"unknown\"}"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text().as_deref(), Some(r#"{"intent": "unknown"}"#));

        let empty: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(empty.text().is_none());
    }

    #[test]
    fn rejects_empty_api_key() {
        let result = GeminiClient::new(
            "  ".into(),
            DEFAULT_BASE_URL.into(),
            DEFAULT_MODEL.into(),
            Duration::from_secs(5),
        );
        assert!(matches!(result, Err(ClassifyError::InvalidInput(_))));
    }

    #[test]
    fn strips_model_prefix() {
        let client = GeminiClient::new(
            "key".into(),
            "http://localhost:1/".into(),
            "models/gemini-2.5-flash".into(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.model_id(), "gemini-2.5-flash");
        assert_eq!(client.base_url, "http://localhost:1");
    }
}
