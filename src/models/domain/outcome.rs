use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Correct,
    Incorrect,
    Skipped,
    Error,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Correct => write!(f, "correct"),
            OutcomeStatus::Incorrect => write!(f, "incorrect"),
            OutcomeStatus::Skipped => write!(f, "skipped"),
            OutcomeStatus::Error => write!(f, "error"),
        }
    }
}

/// Terminal result of one question in the chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuestionOutcome {
    pub status: OutcomeStatus,
    pub next_url: Option<String>,
}

impl QuestionOutcome {
    pub fn new(status: OutcomeStatus, next_url: Option<String>) -> Self {
        // An empty string never continues the chain.
        let next_url = next_url.filter(|url| !url.trim().is_empty());
        Self { status, next_url }
    }

    pub fn correct(next_url: Option<String>) -> Self {
        Self::new(OutcomeStatus::Correct, next_url)
    }

    pub fn incorrect(next_url: Option<String>) -> Self {
        Self::new(OutcomeStatus::Incorrect, next_url)
    }

    pub fn skipped(next_url: Option<String>) -> Self {
        Self::new(OutcomeStatus::Skipped, next_url)
    }

    pub fn error() -> Self {
        Self::new(OutcomeStatus::Error, None)
    }

    /// Keeps `fallback` as the continuation when this outcome has none.
    pub fn or_next_url(self, fallback: Option<String>) -> Self {
        match self.next_url {
            Some(_) => self,
            None => Self::new(self.status, fallback),
        }
    }
}

/// Running counters for a whole chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SequenceStats {
    pub total: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub skipped: u32,
    pub errors: u32,
}

impl SequenceStats {
    pub fn record(&mut self, outcome: &QuestionOutcome) {
        self.total += 1;
        match outcome.status {
            OutcomeStatus::Correct => self.correct += 1,
            OutcomeStatus::Incorrect => self.incorrect += 1,
            OutcomeStatus::Skipped => self.skipped += 1,
            OutcomeStatus::Error => self.errors += 1,
        }
    }
}
