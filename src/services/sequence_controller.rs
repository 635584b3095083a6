//! Drives a quiz chain question by question.
//!
//! Every question runs FETCHING, GENERATING, EXECUTING and PARSING against its
//! own clock, then settles on one of correct, incorrect, skipped or error.
//! Retries are bounded by the remaining time rather than by attempt counts.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::errors::AppResult;
use crate::models::domain::{
    ExecutionResult, QuestionData, QuestionOutcome, RetryFeedback, SequenceStats,
    SubmissionVerdict,
};
use crate::services::code_runner::CodeRunner;
use crate::services::fallback_submitter::AnswerSubmitter;
use crate::services::page_fetcher::PageFetcher;
use crate::services::question_clock::{QuestionBudget, QuestionClock};
use crate::services::solution_generator::SolutionGenerator;

const BANNER: &str =
    "================================================================================";

/// Adapters shared by every chain.
#[derive(Clone)]
pub struct SolverServices {
    pub fetcher: Arc<dyn PageFetcher>,
    pub generator: Arc<dyn SolutionGenerator>,
    pub runner: Arc<dyn CodeRunner>,
    pub submitter: Arc<dyn AnswerSubmitter>,
}

pub struct SequenceController {
    chain_id: String,
    services: SolverServices,
    budget: QuestionBudget,
}

impl SequenceController {
    pub fn new(
        chain_id: impl Into<String>,
        services: SolverServices,
        budget: QuestionBudget,
    ) -> Self {
        Self {
            chain_id: chain_id.into(),
            services,
            budget,
        }
    }

    /// Follows the chain from `initial_url` until a question yields no next
    /// URL. Never fails; every problem is folded into the statistics.
    pub async fn solve_sequence(
        &self,
        initial_url: &str,
        sequence_start: DateTime<Utc>,
    ) -> SequenceStats {
        let id = &self.chain_id;
        log::info!("[{}] {}", id, BANNER);
        log::info!("[{}] Starting quiz sequence", id);
        log::info!("[{}] Initial URL: {}", id, initial_url);
        log::info!("[{}] Sequence start: {}", id, sequence_start.to_rfc3339());
        log::info!(
            "[{}] Per-question timeout: {}s",
            id,
            self.budget.timeout.as_secs()
        );
        log::info!("[{}] {}", id, BANNER);

        let mut stats = SequenceStats::default();
        let mut current_url = Some(initial_url.to_string());

        while let Some(url) = current_url.take() {
            log::info!("[{}] {}", id, BANNER);
            log::info!("[{}] QUIZ #{}", id, stats.total + 1);
            log::info!("[{}] URL: {}", id, url);
            log::info!(
                "[{}] Total sequence time: {:.1}s",
                id,
                seconds_since(sequence_start)
            );
            log::info!("[{}] {}", id, BANNER);

            let outcome = self.solve_question(&url).await;
            log::info!("[{}] Quiz #{} finished as {}", id, stats.total + 1, outcome.status);
            stats.record(&outcome);

            match outcome.next_url {
                Some(next) => {
                    log::info!("[{}] Moving to next quiz: {}", id, next);
                    current_url = Some(next);
                }
                None => log::info!("[{}] No next URL, quiz sequence completed", id),
            }
        }

        log::info!("[{}] {}", id, BANNER);
        log::info!("[{}] QUIZ SEQUENCE ENDED", id);
        log::info!("[{}] Total quizzes attempted: {}", id, stats.total);
        log::info!("[{}]   Correct: {}", id, stats.correct);
        log::info!("[{}]   Incorrect: {}", id, stats.incorrect);
        log::info!("[{}]   Skipped: {}", id, stats.skipped);
        log::info!("[{}]   Errors: {}", id, stats.errors);
        log::info!(
            "[{}] Total sequence time: {:.1}s",
            id,
            seconds_since(sequence_start)
        );
        log::info!("[{}] {}", id, BANNER);

        stats
    }

    /// Solves one question on a fresh clock. Adapter errors end the question
    /// as an error with no continuation.
    pub async fn solve_question(&self, quiz_url: &str) -> QuestionOutcome {
        let clock = self.budget.start_clock();
        match self.attempt_question(quiz_url, &clock).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("[{}] Unexpected error: {}", self.chain_id, e);
                QuestionOutcome::error()
            }
        }
    }

    async fn attempt_question(
        &self,
        quiz_url: &str,
        clock: &QuestionClock,
    ) -> AppResult<QuestionOutcome> {
        let id = &self.chain_id;

        log::info!("[{}] Step 1: visiting quiz page", id);
        let question = self.services.fetcher.fetch(quiz_url).await?;
        log::info!("[{}] Question extracted", id);

        log::info!("[{}] Step 2: generating solution", id);
        let code = match self.services.generator.generate(&question, None).await {
            Some(code) => code,
            None => {
                log::error!("[{}] Model produced no code", id);
                let remaining = clock.remaining_secs();
                if !self.budget.allows_round_trip(remaining) {
                    log::warn!("[{}] Only {:.1}s remaining, not regenerating", id, remaining);
                    return Ok(self.fallback(quiz_url).await);
                }
                log::info!("[{}] Regenerating solution", id);
                match self.services.generator.generate(&question, None).await {
                    Some(code) => code,
                    None => {
                        log::error!("[{}] Regeneration also produced no code", id);
                        return Ok(QuestionOutcome::error());
                    }
                }
            }
        };
        log::info!("[{}] Solution generated", id);

        log::info!("[{}] Step 3: executing solution", id);
        let execution = self.services.runner.run(&code, quiz_url).await?;

        if !execution.succeeded {
            log::error!("[{}] Execution failed: {}", id, execution.error_summary());
            let remaining = clock.remaining_secs();
            if self.budget.allows_round_trip(remaining) {
                return Ok(self
                    .retry_with_fix(&question, quiz_url, &code, execution.error_summary(), clock)
                    .await);
            }
            log::warn!("[{}] Only {:.1}s remaining, not retrying", id, remaining);
            return Ok(self.fallback(quiz_url).await);
        }
        log::info!("[{}] Code executed successfully", id);

        log::info!("[{}] Step 4: reading submission result", id);
        let verdict = &execution.submission;
        if verdict.is_empty() {
            log::warn!("[{}] Solution printed nothing", id);
            return Ok(self.fallback(quiz_url).await);
        }

        match verdict.correct {
            Some(true) => {
                log::info!("[{}] Answer was correct", id);
                Ok(QuestionOutcome::correct(verdict.next_url.clone()))
            }
            Some(false) => {
                log::warn!("[{}] Answer was incorrect", id);
                let feedback = RetryFeedback::new(
                    verdict.reason.as_deref(),
                    code.as_str(),
                    execution.captured_output.as_str(),
                );
                log::info!("[{}] Reason: {}", id, feedback.reason);

                let remaining = clock.remaining_secs();
                if self.budget.allows_round_trip(remaining) {
                    log::info!("[{}] {:.1}s remaining, retrying with feedback", id, remaining);
                    let retried = self
                        .retry_with_feedback(&question, quiz_url, feedback, clock)
                        .await;
                    return Ok(retried.or_next_url(verdict.next_url.clone()));
                }

                match &verdict.next_url {
                    Some(next) => {
                        log::warn!(
                            "[{}] Only {:.1}s remaining, skipping to {}",
                            id,
                            remaining,
                            next
                        );
                        Ok(QuestionOutcome::skipped(Some(next.clone())))
                    }
                    None => {
                        log::warn!("[{}] No time to retry and no next URL", id);
                        Ok(QuestionOutcome::incorrect(None))
                    }
                }
            }
            None => {
                log::warn!("[{}] Could not determine submission result", id);
                Ok(QuestionOutcome::error())
            }
        }
    }

    /// One attempt at repairing code that raised.
    async fn retry_with_fix(
        &self,
        question: &QuestionData,
        quiz_url: &str,
        failed_code: &str,
        error: &str,
        clock: &QuestionClock,
    ) -> QuestionOutcome {
        let id = &self.chain_id;
        log::info!("[{}] Retry attempt after execution error", id);

        if !self.budget.allows_retry(clock.remaining_secs()) {
            log::warn!("[{}] Out of time for a fix", id);
            return QuestionOutcome::error();
        }

        let fixed_code = match self
            .services
            .generator
            .generate_fix(question, failed_code, error)
            .await
        {
            Ok(code) => code,
            Err(e) => {
                log::error!("[{}] Fix generation failed: {}", id, e);
                return QuestionOutcome::error();
            }
        };

        match self.run_retry(&fixed_code, quiz_url).await {
            Some(execution) => graded_outcome(&execution.submission),
            None => QuestionOutcome::error(),
        }
    }

    /// One attempt at a new solution informed by the grader's rejection.
    async fn retry_with_feedback(
        &self,
        question: &QuestionData,
        quiz_url: &str,
        feedback: RetryFeedback,
        clock: &QuestionClock,
    ) -> QuestionOutcome {
        let id = &self.chain_id;
        log::info!("[{}] Retry attempt after incorrect answer", id);

        if !self.budget.allows_retry(clock.remaining_secs()) {
            log::warn!("[{}] Out of time for a feedback retry", id);
            return QuestionOutcome::incorrect(None);
        }

        let Some(retry_code) = self.services.generator.generate(question, Some(feedback)).await
        else {
            log::error!("[{}] Model produced no retry code", id);
            return QuestionOutcome::error();
        };

        match self.run_retry(&retry_code, quiz_url).await {
            Some(execution) if execution.submission.is_empty() => {
                log::warn!("[{}] Retry printed nothing", id);
                QuestionOutcome::error()
            }
            Some(execution) => graded_outcome(&execution.submission),
            None => QuestionOutcome::error(),
        }
    }

    /// Runs retry code; `None` when the runner broke or the code raised.
    async fn run_retry(&self, code: &str, quiz_url: &str) -> Option<ExecutionResult> {
        match self.services.runner.run(code, quiz_url).await {
            Ok(execution) if execution.succeeded => Some(execution),
            Ok(execution) => {
                log::error!(
                    "[{}] Retry execution failed: {}",
                    self.chain_id,
                    execution.error_summary()
                );
                None
            }
            Err(e) => {
                log::error!("[{}] Retry execution failed: {}", self.chain_id, e);
                None
            }
        }
    }

    async fn fallback(&self, quiz_url: &str) -> QuestionOutcome {
        log::info!("[{}] Submitting fallback answer", self.chain_id);
        match self.services.submitter.submit_fallback(quiz_url).await {
            Ok(next_url) => QuestionOutcome::incorrect(next_url),
            Err(e) => {
                log::error!("[{}] Fallback submission failed: {}", self.chain_id, e);
                QuestionOutcome::error()
            }
        }
    }
}

/// Retry helpers treat anything short of `correct == true` as incorrect.
fn graded_outcome(verdict: &SubmissionVerdict) -> QuestionOutcome {
    if verdict.correct == Some(true) {
        QuestionOutcome::correct(verdict.next_url.clone())
    } else {
        QuestionOutcome::incorrect(verdict.next_url.clone())
    }
}

fn seconds_since(start: DateTime<Utc>) -> f64 {
    (Utc::now() - start).num_milliseconds() as f64 / 1000.0
}
