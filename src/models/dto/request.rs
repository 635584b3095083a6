use serde::{Deserialize, Serialize};
use validator::Validate;

/// Webhook body that starts a quiz chain.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuizTriggerRequest {
    /// Compared against the configured address, never format-checked.
    pub email: String,

    #[validate(length(min = 1, message = "Secret must not be empty"))]
    pub secret: String,

    #[validate(url(message = "Invalid quiz URL"))]
    pub url: String,
}

/// Body of the "FAILED" submission posted straight to a quiz URL.
#[derive(Debug, Clone, Serialize)]
pub struct FallbackSubmissionRequest<'a> {
    pub email: &'a str,
    pub secret: &'a str,
    pub url: &'a str,
    pub answer: &'a str,
}
