//! HTTP chat-completion judge.
//!
//! `HttpJudge` implements the `Judge` trait against any OpenAI-compatible
//! `/chat/completions` endpoint.  One request per judgment: a fixed system
//! instruction plus the criteria and (pre-truncated) content, temperature 0,
//! bounded by the configured timeout.  The reply must contain `true` or
//! `false`; anything else fails soft as `LlmJudge`.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use palisade_contracts::error::{GuardError, GuardResult};
use palisade_engine::Judge;

use crate::config::JudgeConfig;

/// The fixed system instruction sent with every judgment.
const SYSTEM_INSTRUCTION: &str = "You are a guardrail evaluator. Decide whether the provided \
content satisfies the given criteria. Respond with exactly one word: \"true\" if it does, \
\"false\" if it does not.";

/// An LLM judge backed by an OpenAI-compatible chat-completion endpoint.
///
/// Construct via [`HttpJudge::new`], or [`HttpJudge::with_client`] to share
/// a `reqwest::Client` across components.
pub struct HttpJudge {
    config: JudgeConfig,
    client: reqwest::Client,
}

impl HttpJudge {
    /// Create a judge with its own HTTP client.
    pub fn new(config: JudgeConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Create a judge sharing an existing HTTP client.
    pub fn with_client(config: JudgeConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// Build request headers: JSON content type plus bearer auth when a key
    /// is configured and present in the environment.
    fn build_headers(&self) -> GuardResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(api_key) = self.config.api_key() {
            let value = format!("Bearer {}", api_key);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&value).map_err(|e| GuardError::ConfigError {
                    reason: format!("invalid API key header: {}", e),
                })?,
            );
        }

        Ok(headers)
    }

    fn build_body(&self, content: &str, criteria: &str) -> serde_json::Value {
        json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_INSTRUCTION },
                {
                    "role": "user",
                    "content": format!("Criteria: {}\n\nContent:\n{}", criteria, content)
                }
            ],
            "temperature": 0.0
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Extract the boolean verdict from a judge reply.
///
/// Case-insensitive substring check; `true` is looked for first.  A reply
/// containing neither word is an `LlmJudge` error.
fn parse_verdict(reply: &str) -> GuardResult<bool> {
    let lower = reply.to_lowercase();
    if lower.contains("true") {
        Ok(true)
    } else if lower.contains("false") {
        Ok(false)
    } else {
        Err(GuardError::LlmJudge {
            reason: format!("judge reply contains neither 'true' nor 'false': '{}'", reply),
        })
    }
}

fn judge_error(reason: impl std::fmt::Display) -> GuardError {
    GuardError::LlmJudge {
        reason: reason.to_string(),
    }
}

#[async_trait]
impl Judge for HttpJudge {
    async fn judge(&self, content: &str, criteria: &str) -> GuardResult<bool> {
        let headers = self.build_headers()?;
        let body = self.build_body(content, criteria);

        debug!(
            endpoint = %self.config.endpoint,
            model = %self.config.model,
            content_chars = content.chars().count(),
            "sending judge request"
        );

        let send = self
            .client
            .post(self.config.endpoint.as_str())
            .headers(headers)
            .json(&body)
            .send();

        let response = tokio::time::timeout(self.config.timeout(), send)
            .await
            .map_err(|_| {
                judge_error(format!(
                    "judge call timed out after {}s",
                    self.config.timeout_secs
                ))
            })?
            .map_err(|e| judge_error(format!("judge request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(%status, "judge endpoint returned an error");
            return Err(judge_error(format!(
                "judge endpoint returned {}: {}",
                status, detail
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| judge_error(format!("malformed judge response: {}", e)))?;

        let reply = parsed
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .ok_or_else(|| judge_error("judge response contains no choices"))?;

        parse_verdict(reply)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
