use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct QuizAcceptedResponse {
    pub status: &'static str,
    pub message: String,
    pub email: String,
    pub url: String,
}

impl QuizAcceptedResponse {
    pub fn new(email: String, url: String) -> Self {
        Self {
            status: "accepted",
            message: "Quiz solving process initiated".to_string(),
            email,
            url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub email: String,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfoResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub student: String,
    pub endpoints: serde_json::Value,
}
