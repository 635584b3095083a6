//! LLM-backed code generation over an OpenAI-compatible chat endpoint.

use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use secrecy::ExposeSecret;
use serde_json::{json, Value};

use crate::config::Config;
use crate::constants::prompts::{build_fix_prompt, build_solution_prompt, SOLUTION_SYSTEM_PROMPT};
use crate::errors::{AppError, AppResult};
use crate::models::domain::{QuestionData, RetryFeedback};

static OPENING_FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^```[A-Za-z0-9_+-]*[ \t]*\r?\n")
        .expect("OPENING_FENCE_RE is a valid regex pattern")
});

static CLOSING_FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^```[ \t]*$").expect("CLOSING_FENCE_RE is a valid regex pattern")
});

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SolutionGenerator: Send + Sync {
    /// Candidate code for `question`, or `None` when the model produced
    /// nothing usable. Upstream failures are logged, not returned.
    async fn generate(
        &self,
        question: &QuestionData,
        feedback: Option<RetryFeedback>,
    ) -> Option<String>;

    /// Corrected code for a solution that raised `error`.
    async fn generate_fix(
        &self,
        question: &QuestionData,
        failed_code: &str,
        error: &str,
    ) -> AppResult<String>;
}

pub struct OpenAiSolutionGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAiSolutionGenerator {
    pub fn new(client: Client<OpenAIConfig>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.llm_api_key.expose_secret())
            .with_api_base(config.llm_api_base.clone());
        log::info!("Solution generator using model {}", config.llm_model);
        Self::new(
            Client::with_config(openai_config),
            config.llm_model.clone(),
            config.llm_temperature,
        )
    }

    async fn complete(&self, user_prompt: String) -> AppResult<String> {
        let request = json!({
            "model": self.model,
            "temperature": self.temperature,
            "n": 1,
            "messages": [
                { "role": "system", "content": SOLUTION_SYSTEM_PROMPT },
                { "role": "user", "content": user_prompt },
            ],
        });

        let response: Value = self.client.chat().create_byot(request).await?;
        let content = response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AppError::GenerationError("Model response has no message content".to_string())
            })?;
        log::info!("Received model response of {} characters", content.len());

        let code = clean_generated_code(content);
        if code.is_empty() {
            return Err(AppError::GenerationError(
                "Model response contained no code".to_string(),
            ));
        }
        Ok(code)
    }
}

#[async_trait]
impl SolutionGenerator for OpenAiSolutionGenerator {
    async fn generate(
        &self,
        question: &QuestionData,
        feedback: Option<RetryFeedback>,
    ) -> Option<String> {
        log::info!(
            "Generating solution code (question length {} chars{})",
            question.question_text.len(),
            if feedback.is_some() { ", with feedback" } else { "" }
        );
        let prompt = build_solution_prompt(question, feedback.as_ref());
        match self.complete(prompt).await {
            Ok(code) => Some(code),
            Err(e) => {
                log::error!("Failed to generate solution: {}", e);
                None
            }
        }
    }

    async fn generate_fix(
        &self,
        question: &QuestionData,
        failed_code: &str,
        error: &str,
    ) -> AppResult<String> {
        log::info!("Generating fix for: {}", error);
        self.complete(build_fix_prompt(question, failed_code, error))
            .await
            .inspect_err(|e| log::error!("Failed to generate fix: {}", e))
    }
}

/// Strips markdown code fences and surrounding whitespace.
pub fn clean_generated_code(raw: &str) -> String {
    let without_opening = OPENING_FENCE_RE.replace_all(raw, "");
    let without_fences = CLOSING_FENCE_RE.replace_all(&without_opening, "");
    without_fences.trim().to_string()
}
