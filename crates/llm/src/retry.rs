//! Bounded retry for HTTP providers.
//!
//! Only transport-level trouble is retried: connect failures, timeouts,
//! `429 Too Many Requests` and `5xx` responses. Everything else is returned
//! to the caller on the first attempt.

use reqwest::StatusCode;
use serde::Deserialize;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Cap on how much of an error body is kept for messages.
const MAX_ERROR_BODY_BYTES: usize = 8 * 1024;

/// Retry schedule with capped exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        }
    }
}

/// Failure of a single HTTP exchange after retries are exhausted.
#[derive(Debug)]
pub enum SendError {
    Transport(reqwest::Error),
    Status { status: StatusCode, message: String },
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Transport(e) => write!(f, "request failed: {}", e),
            SendError::Status { status, message } => {
                write!(f, "upstream returned {}: {}", status, message)
            }
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (zero-based).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let mult = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        std::cmp::min(self.initial_backoff.saturating_mul(mult), self.max_backoff)
    }

    /// Send a request, retrying transient failures.
    ///
    /// `send` is called once per attempt and must build a fresh request each
    /// time. A successful status returns the response untouched.
    pub async fn send<F, Fut>(&self, label: &str, mut send: F) -> Result<reqwest::Response, SendError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        let mut attempt: u32 = 0;
        loop {
            let error = match send().await {
                Ok(resp) if resp.status().is_success() => return Ok(resp),
                Ok(resp) => {
                    let status = resp.status();
                    let message = read_error_message(resp).await;
                    SendError::Status { status, message }
                }
                Err(e) => SendError::Transport(e),
            };

            if attempt >= self.max_retries || !is_retryable(&error) {
                return Err(error);
            }

            let delay = self.backoff_delay(attempt);
            attempt += 1;
            tracing::warn!(
                target: "navigator_llm::retry",
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "{} request failed, retrying",
                label
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn is_retryable(error: &SendError) -> bool {
    match error {
        SendError::Transport(e) => e.is_timeout() || e.is_connect(),
        SendError::Status { status, .. } => is_retryable_status(*status),
    }
}

/// `429` and server errors are worth another attempt.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorObject,
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    message: Option<String>,
}

/// Extract a readable message from an error body.
///
/// Understands the `{"error": {"message": ...}}` envelope and Ollama's
/// `{"error": "..."}`; otherwise returns the (truncated) raw body.
pub fn parse_error_body(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        if let Some(message) = envelope.error.message {
            return message;
        }
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value.get("error").and_then(|e| e.as_str()) {
            return message.to_string();
        }
    }
    let mut end = body.len().min(MAX_ERROR_BODY_BYTES);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_string()
}

async fn read_error_message(resp: reqwest::Response) -> String {
    match resp.text().await {
        Ok(body) => parse_error_body(&body),
        Err(e) => format!("<failed to read error body: {}>", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(0), Duration::from_millis(200));
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(400));
        assert_eq!(policy.backoff_delay(10), Duration::from_secs(5));
        assert_eq!(policy.backoff_delay(64), Duration::from_secs(5));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable_status(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn test_parse_error_body_envelopes() {
        let openai = r#"{"error": {"message": "Incorrect API key", "type": "invalid_request_error"}}"#;
        assert_eq!(parse_error_body(openai), "Incorrect API key");

        let ollama = r#"{"error": "model 'llama9' not found"}"#;
        assert_eq!(parse_error_body(ollama), "model 'llama9' not found");

        assert_eq!(parse_error_body("Bad Gateway"), "Bad Gateway");
    }
}
