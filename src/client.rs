use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::Client;
use serde::Deserialize;

use crate::config::{ModelCatalog, ModelEntry};
use crate::error::GustError;
use crate::retry::{RetryPolicy, with_retry};

const MAX_RESPONSE_BYTES: usize = 2 * 1024 * 1024; // 2MB

/// One completion call. Immutable once built; `request_id` correlates
/// log lines with the upstream request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f64,
    pub request_id: String,
}

impl CompletionRequest {
    pub fn new(model: &str, prompt: String, temperature: f64, ordinal: usize) -> Self {
        // Derived from submission time; the ordinal disambiguates rows
        // submitted within the same millisecond.
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        Self {
            model: model.to_string(),
            prompt,
            temperature,
            request_id: format!("req_{millis}_{ordinal}"),
        }
    }
}

/// The seam between the row scheduler and the network. The scheduler
/// only ever sees text out or an error; retry lives behind this trait.
pub trait CompletionBackend: Send + Sync {
    fn complete(
        &self,
        req: &CompletionRequest,
    ) -> impl Future<Output = Result<String, GustError>> + Send;
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

/// HTTP chat-completions client with bounded retry. The model must
/// resolve in the catalog before any network attempt is made.
pub struct LlmClient {
    http: Client,
    catalog: ModelCatalog,
    retry: RetryPolicy,
}

impl LlmClient {
    pub fn new(catalog: ModelCatalog) -> Self {
        Self::with_retry_policy(catalog, RetryPolicy::default())
    }

    pub fn with_retry_policy(catalog: ModelCatalog, retry: RetryPolicy) -> Self {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(4)
            .build()
            .expect("failed to build HTTP client");
        Self {
            http,
            catalog,
            retry,
        }
    }

    async fn query_once(
        &self,
        req: &CompletionRequest,
        entry: &ModelEntry,
    ) -> Result<String, GustError> {
        let body = serde_json::json!({
            "model": entry.model_id,
            "messages": [{"role": "user", "content": req.prompt}],
            "temperature": req.temperature,
            "metadata": {"request_id": req.request_id},
        });

        let response = self
            .http
            .post(&entry.base_url)
            .header("Authorization", format!("Bearer {}", entry.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GustError::RateLimited {
                provider: entry.provider.clone(),
            });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(GustError::AuthFailed {
                provider: entry.provider.clone(),
                message: format!("{status}"),
            });
        }

        // Catch-all for any non-success status. Cap error body reads to
        // MAX_RESPONSE_BYTES to prevent memory exhaustion.
        if !status.is_success() {
            let error_bytes = response.bytes().await.unwrap_or_default();
            let truncated = &error_bytes[..error_bytes.len().min(MAX_RESPONSE_BYTES)];
            let text = String::from_utf8_lossy(truncated);
            return Err(GustError::Upstream {
                provider: entry.provider.clone(),
                message: format!("{status}: {text}"),
                status: Some(status.as_u16()),
            });
        }

        let bytes = response.bytes().await.map_err(|e| GustError::Upstream {
            provider: entry.provider.clone(),
            message: format!("failed to read response body: {e}"),
            status: None,
        })?;

        if bytes.len() > MAX_RESPONSE_BYTES {
            return Err(GustError::Upstream {
                provider: entry.provider.clone(),
                message: format!(
                    "response too large: {} bytes (max {})",
                    bytes.len(),
                    MAX_RESPONSE_BYTES
                ),
                status: None,
            });
        }

        let completion: ChatCompletion = serde_json::from_slice(&bytes)
            .map_err(|e| GustError::SchemaParse(format!("failed to parse response: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GustError::Upstream {
                provider: entry.provider.clone(),
                message: "empty choices or null content".to_string(),
                status: None,
            })
    }
}

impl CompletionBackend for LlmClient {
    async fn complete(&self, req: &CompletionRequest) -> Result<String, GustError> {
        // Unmapped model fails fast — no network attempt, no retry.
        let entry = self
            .catalog
            .get(&req.model)
            .ok_or_else(|| GustError::ModelNotFound {
                model: req.model.clone(),
            })?;

        with_retry(self.retry, || self.query_once(req, entry)).await
    }
}
