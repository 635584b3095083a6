use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

/// Grading result recovered from the output of one execution.
///
/// `correct` is tri-state: `None` means no determination was found, which is
/// handled differently from an explicit `Some(false)`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SubmissionVerdict {
    pub correct: Option<bool>,
    pub next_url: Option<String>,
    pub reason: Option<String>,
    pub status_code: Option<u16>,
    #[serde(skip)]
    scanned: bool,
}

impl SubmissionVerdict {
    /// Verdict for an execution that printed nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Verdict produced by scanning non-empty output, fields still unset.
    pub fn scanned() -> Self {
        Self {
            scanned: true,
            ..Self::default()
        }
    }

    /// True when there was no output to scan at all.
    pub fn is_empty(&self) -> bool {
        !self.scanned
    }

    pub fn with_correct(mut self, correct: bool) -> Self {
        self.correct = Some(correct);
        self
    }

    pub fn with_next_url(mut self, next_url: impl Into<String>) -> Self {
        self.next_url = Some(next_url.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }
}

/// Renders the verdict in the same labelled form generated code prints.
impl fmt::Display for SubmissionVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = self.status_code {
            writeln!(f, "REQUEST_STATUS: {}", code)?;
        }

        let mut body = Map::new();
        if let Some(correct) = self.correct {
            body.insert("correct".to_string(), Value::Bool(correct));
        }
        if let Some(url) = &self.next_url {
            body.insert("url".to_string(), Value::String(url.clone()));
        }
        if let Some(reason) = &self.reason {
            body.insert("reason".to_string(), Value::String(reason.clone()));
        }
        write!(f, "SERVER_RESPONSE: {}", Value::Object(body))
    }
}

/// Outcome of running one piece of generated code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub succeeded: bool,
    pub captured_output: String,
    pub error_message: Option<String>,
    pub error_detail: Option<String>,
    pub submission: SubmissionVerdict,
}

impl ExecutionResult {
    pub fn success(captured_output: impl Into<String>, submission: SubmissionVerdict) -> Self {
        Self {
            succeeded: true,
            captured_output: captured_output.into(),
            error_message: None,
            error_detail: None,
            submission,
        }
    }

    pub fn failure(
        captured_output: impl Into<String>,
        error_message: impl Into<String>,
        error_detail: Option<String>,
        submission: SubmissionVerdict,
    ) -> Self {
        Self {
            succeeded: false,
            captured_output: captured_output.into(),
            error_message: Some(error_message.into()),
            error_detail,
            submission,
        }
    }

    pub fn error_summary(&self) -> &str {
        self.error_message.as_deref().unwrap_or("Unknown execution error")
    }
}
