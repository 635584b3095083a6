use serde::{Deserialize, Serialize};

/// A quiz page as seen by the solver.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuestionData {
    pub question_text: String,
    pub raw_page_content: String,
    pub url: String,
}

impl QuestionData {
    pub fn new(
        question_text: impl Into<String>,
        raw_page_content: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            question_text: question_text.into(),
            raw_page_content: raw_page_content.into(),
            url: url.into(),
        }
    }
}

pub const NO_REASON_PROVIDED: &str = "No reason provided";

/// Context from a graded-but-wrong attempt, fed back to the generator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryFeedback {
    pub reason: String,
    pub failed_code: String,
    pub previous_output: String,
}

impl RetryFeedback {
    pub fn new(
        reason: Option<&str>,
        failed_code: impl Into<String>,
        previous_output: impl Into<String>,
    ) -> Self {
        Self {
            reason: reason.unwrap_or(NO_REASON_PROVIDED).to_string(),
            failed_code: failed_code.into(),
            previous_output: previous_output.into(),
        }
    }
}
