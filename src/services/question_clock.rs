use std::time::Duration;

use tokio::time::Instant;

use crate::config::Config;

/// Per-question time policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuestionBudget {
    pub timeout: Duration,
    pub skip_threshold: Duration,
}

impl QuestionBudget {
    pub fn new(timeout: Duration, skip_threshold: Duration) -> Self {
        Self {
            timeout,
            skip_threshold,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Duration::from_secs(config.quiz_timeout_seconds),
            Duration::from_secs(config.skip_threshold_seconds),
        )
    }

    /// Whether another LLM round trip is worth starting.
    pub fn allows_round_trip(&self, remaining_secs: f64) -> bool {
        remaining_secs > self.skip_threshold.as_secs_f64() * 2.0
    }

    /// Floor checked by the single-shot retry helpers.
    pub fn allows_retry(&self, remaining_secs: f64) -> bool {
        remaining_secs >= self.skip_threshold.as_secs_f64()
    }

    pub fn start_clock(&self) -> QuestionClock {
        QuestionClock {
            started: Instant::now(),
            budget: self.timeout,
        }
    }
}

/// Clock started when a question begins; never shared between questions.
#[derive(Debug, Clone, Copy)]
pub struct QuestionClock {
    started: Instant,
    budget: Duration,
}

impl QuestionClock {
    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Seconds left in the budget; negative once overrun.
    pub fn remaining_secs(&self) -> f64 {
        self.budget.as_secs_f64() - self.elapsed_secs()
    }
}
