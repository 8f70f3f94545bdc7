use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::AnalysisError;

const SERVICE: &str = "completion";

/// Text-in, text-out access to a language model.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Model identifier recorded in reports.
    fn model(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, AnalysisError>;
}

/// OpenAI-compatible `/chat/completions` client.
pub struct ApiClient {
    base_url: String,
    api_key: String,
    model: String,
    referer: Option<String>,
    client: reqwest::Client,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("referer", &self.referer)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| AnalysisError::Transport {
                service: SERVICE,
                source,
            })?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            referer: None,
            client,
        })
    }

    /// Send `HTTP-Referer` with every request.
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        let referer = referer.into();
        self.referer = (!referer.trim().is_empty()).then_some(referer);
        self
    }
}

#[async_trait]
impl CompletionClient for ApiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, AnalysisError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut request = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": [
                    {"role": "user", "content": prompt}
                ]
            }));
        if let Some(referer) = &self.referer {
            request = request.header("HTTP-Referer", referer);
        }

        debug!(model = %self.model, prompt_chars = prompt.len(), "sending completion request");
        let response = request
            .send()
            .await
            .map_err(|source| AnalysisError::Transport {
                service: SERVICE,
                source,
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|source| AnalysisError::Transport {
                service: SERVICE,
                source,
            })?;

        if status.is_success() {
            return parse_completion_content(&body);
        }
        if is_rate_or_quota_error(status, &body) {
            return Err(AnalysisError::RateLimited {
                retry_after: parse_retry_after(&headers),
            });
        }
        Err(AnalysisError::Completion {
            status: status.as_u16(),
            body,
        })
    }
}

fn is_rate_or_quota_error(status: StatusCode, body: &str) -> bool {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return true;
    }

    let body_lower = body.to_ascii_lowercase();
    body_lower.contains("rate_limit") || body_lower.contains("quota")
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let raw = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(seconds) = raw.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let retry_at = DateTime::parse_from_rfc2822(raw).ok()?.with_timezone(&Utc);
    let seconds = (retry_at - Utc::now()).num_seconds().max(0) as u64;
    Some(Duration::from_secs(seconds))
}

fn parse_completion_content(body: &str) -> Result<String, AnalysisError> {
    let malformed = |reason: String| AnalysisError::MalformedResponse {
        service: SERVICE,
        reason,
    };
    let value: Value = serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;
    value
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| malformed("missing choices[0].message.content".to_string()))
}
