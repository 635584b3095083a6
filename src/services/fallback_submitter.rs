use async_trait::async_trait;
use serde_json::Value;

use crate::errors::{AppError, AppResult};
use crate::models::domain::Credentials;
use crate::models::dto::FallbackSubmissionRequest;

pub const FALLBACK_ANSWER: &str = "FAILED";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnswerSubmitter: Send + Sync {
    /// Posts the fallback answer for `quiz_url` and returns the `url` the
    /// grader replied with, if any. `Err` when the POST fails or the reply
    /// is not a JSON object.
    async fn submit_fallback(&self, quiz_url: &str) -> AppResult<Option<String>>;
}

pub struct HttpFallbackSubmitter {
    client: reqwest::Client,
    credentials: Credentials,
}

impl HttpFallbackSubmitter {
    pub fn new(client: reqwest::Client, credentials: Credentials) -> Self {
        Self {
            client,
            credentials,
        }
    }
}

#[async_trait]
impl AnswerSubmitter for HttpFallbackSubmitter {
    async fn submit_fallback(&self, quiz_url: &str) -> AppResult<Option<String>> {
        log::warn!("Sending fallback submission for {}", quiz_url);

        let payload = FallbackSubmissionRequest {
            email: &self.credentials.email,
            secret: self.credentials.secret(),
            url: quiz_url,
            answer: FALLBACK_ANSWER,
        };
        let response = self
            .client
            .post(quiz_url)
            .json(&payload)
            .send()
            .await
            .inspect_err(|e| log::error!("Fallback submission failed: {}", e))?;

        let status = response.status();
        let body = response.text().await?;
        log::warn!("Fallback status: {}", status.as_u16());
        log::warn!("Fallback response: {}", body);

        next_url_from_reply(&body)
    }
}

/// The `url` field of a grader reply, which must be a JSON object.
pub fn next_url_from_reply(body: &str) -> AppResult<Option<String>> {
    let reply = serde_json::from_str::<Value>(body)
        .map_err(|e| AppError::UpstreamError(format!("Fallback reply is not JSON: {}", e)))?;
    match reply {
        Value::Object(reply) => Ok(reply
            .get("url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .map(str::to_string)),
        other => Err(AppError::UpstreamError(format!(
            "Fallback reply is not a JSON object: {}",
            other
        ))),
    }
}
