use std::env;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::errors::{AppError, AppResult};
use crate::models::domain::Credentials;

const DEFAULT_LLM_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const DEFAULT_LLM_MODEL: &str = "gemini-2.5-pro";

#[derive(Clone, Debug)]
pub struct Config {
    pub student_email: String,
    pub student_secret: SecretString,
    pub llm_api_key: SecretString,
    pub llm_api_base: String,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub quiz_timeout_seconds: u64,
    pub skip_threshold_seconds: u64,
    pub execution_timeout_seconds: u64,
    pub page_fetch_timeout_ms: u64,
    pub python_cmd: String,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub log_dir: String,
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let llm_api_key = env::var("LLM_API_KEY")
            .or_else(|_| env::var("GEMINI_API_KEY"))
            .unwrap_or_default();

        Self {
            student_email: env::var("STUDENT_EMAIL").unwrap_or_default(),
            student_secret: SecretString::from(env::var("STUDENT_SECRET").unwrap_or_default()),
            llm_api_key: SecretString::from(llm_api_key),
            llm_api_base: env::var("LLM_API_BASE")
                .unwrap_or_else(|_| DEFAULT_LLM_API_BASE.to_string()),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string()),
            llm_temperature: parse_or("LLM_TEMPERATURE", 0.1),
            quiz_timeout_seconds: parse_or("QUIZ_TIMEOUT_SECONDS", 180),
            skip_threshold_seconds: parse_or("SKIP_THRESHOLD_SECONDS", 15),
            execution_timeout_seconds: parse_or("EXECUTION_TIMEOUT_SECONDS", 120),
            page_fetch_timeout_ms: parse_or("PAGE_FETCH_TIMEOUT_MS", 30_000),
            python_cmd: env::var("PYTHON_CMD").unwrap_or_else(|_| "python3".to_string()),
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_server_port: parse_or("WEB_SERVER_PORT", 8000),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        }
    }

    /// Rejects configurations the solver cannot run with.
    pub fn validate(&self) -> AppResult<()> {
        if self.student_email.trim().is_empty() {
            return Err(AppError::ConfigError("STUDENT_EMAIL must be set".to_string()));
        }
        if self.student_secret.expose_secret().is_empty() {
            return Err(AppError::ConfigError("STUDENT_SECRET must be set".to_string()));
        }
        if self.llm_api_key.expose_secret().is_empty() {
            return Err(AppError::ConfigError(
                "LLM_API_KEY (or GEMINI_API_KEY) must be set".to_string(),
            ));
        }
        if self.skip_threshold_seconds >= self.quiz_timeout_seconds {
            return Err(AppError::ConfigError(format!(
                "SKIP_THRESHOLD_SECONDS ({}) must be smaller than QUIZ_TIMEOUT_SECONDS ({})",
                self.skip_threshold_seconds, self.quiz_timeout_seconds
            )));
        }
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.student_email.clone(), self.student_secret.clone())
    }

    pub fn page_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.page_fetch_timeout_ms)
    }

    pub fn execution_timeout(&self) -> Duration {
        Duration::from_secs(self.execution_timeout_seconds)
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            student_email: "student@example.com".to_string(),
            student_secret: SecretString::from("test-secret".to_string()),
            llm_api_key: SecretString::from("test-api-key".to_string()),
            llm_api_base: "http://127.0.0.1:9/v1".to_string(),
            llm_model: "test-model".to_string(),
            llm_temperature: 0.1,
            quiz_timeout_seconds: 180,
            skip_threshold_seconds: 15,
            execution_timeout_seconds: 5,
            page_fetch_timeout_ms: 1_000,
            python_cmd: "python3".to_string(),
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8000,
            log_dir: "logs".to_string(),
        }
    }
}
