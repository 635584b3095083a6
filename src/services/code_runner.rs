//! Execution of generated solutions.
//!
//! Each run gets a fresh `python3` child process, so nothing leaks between
//! runs. There is no OS-level sandbox: the child has network access because
//! generated code is expected to POST its answer to the grading endpoint.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::errors::{AppError, AppResult};
use crate::models::domain::{Credentials, ExecutionResult, SubmissionVerdict};
use crate::services::capability_registry::{
    CapabilityRegistry, ENV_QUIZ_URL, ENV_STUDENT_EMAIL, ENV_STUDENT_SECRET, ERROR_MARKER,
};
use crate::services::output_parser::parse_submission;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CodeRunner: Send + Sync {
    /// Runs `code` for the quiz at `quiz_url`. `Err` means the runner itself
    /// broke; a failing solution is an `Ok` result with `succeeded == false`.
    async fn run(&self, code: &str, quiz_url: &str) -> AppResult<ExecutionResult>;
}

pub struct PythonCodeRunner {
    python_cmd: String,
    prelude: String,
    credentials: Credentials,
    timeout: Duration,
}

impl PythonCodeRunner {
    pub fn new(
        python_cmd: impl Into<String>,
        registry: &CapabilityRegistry,
        credentials: Credentials,
        timeout: Duration,
    ) -> Self {
        Self {
            python_cmd: python_cmd.into(),
            prelude: registry.render_prelude(),
            credentials,
            timeout,
        }
    }
}

#[async_trait]
impl CodeRunner for PythonCodeRunner {
    async fn run(&self, code: &str, quiz_url: &str) -> AppResult<ExecutionResult> {
        log::info!("Starting code execution for {}", quiz_url);
        log::debug!("Code to execute:\n{}", code);

        let mut child = Command::new(&self.python_cmd)
            .arg("-c")
            .arg(&self.prelude)
            .env(ENV_STUDENT_EMAIL, &self.credentials.email)
            .env(ENV_STUDENT_SECRET, self.credentials.secret())
            .env(ENV_QUIZ_URL, quiz_url)
            .env("MPLBACKEND", "Agg")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                AppError::ExecutionError(format!("Failed to start '{}': {}", self.python_cmd, e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| AppError::ExecutionError("Child stdin unavailable".to_string()))?;

        let feed = async move {
            if let Err(e) = stdin.write_all(code.as_bytes()).await {
                log::warn!("Could not write solution to interpreter: {}", e);
            }
        };
        // On timeout the child is dropped and killed, which also ends the feed.
        let ((), waited) = tokio::join!(
            feed,
            tokio::time::timeout(self.timeout, child.wait_with_output())
        );

        let result = match waited {
            Ok(Ok(output)) => classify_output(
                String::from_utf8_lossy(&output.stdout).into_owned(),
                &String::from_utf8_lossy(&output.stderr),
                output.status,
            ),
            Ok(Err(e)) => {
                return Err(AppError::ExecutionError(format!(
                    "Failed to collect interpreter output: {}",
                    e
                )))
            }
            Err(_) => ExecutionResult::failure(
                String::new(),
                format!(
                    "TimeoutError: execution exceeded {}s",
                    self.timeout.as_secs()
                ),
                None,
                SubmissionVerdict::empty(),
            ),
        };

        if result.succeeded {
            log::info!("Execution completed");
        } else {
            log::error!("Execution failed: {}", result.error_summary());
            if let Some(detail) = &result.error_detail {
                log::error!("Traceback:\n{}", detail);
            }
        }
        Ok(result)
    }
}

/// Builds the result of a finished run. Output is always parsed, even when
/// the run failed, so partial submissions stay visible.
pub fn classify_output(stdout: String, stderr: &str, status: ExitStatus) -> ExecutionResult {
    let submission = if stdout.is_empty() {
        log::warn!("Code produced no output");
        SubmissionVerdict::empty()
    } else {
        log::info!("Captured output:\n{}", stdout);
        parse_submission(&stdout)
    };

    if status.success() {
        return ExecutionResult::success(stdout, submission);
    }

    let error_message = error_summary(stderr).unwrap_or_else(|| match status.code() {
        Some(code) => format!("ProcessError: interpreter exited with status {}", code),
        None => "ProcessError: interpreter terminated by signal".to_string(),
    });
    let detail = stderr.trim();
    let error_detail = (!detail.is_empty()).then(|| detail.to_string());

    ExecutionResult::failure(stdout, error_message, error_detail, submission)
}

/// `"<Type>: <message>"` for the exception reported by the prelude, falling
/// back to the last line of a traceback.
fn error_summary(stderr: &str) -> Option<String> {
    let marker = format!("{} ", ERROR_MARKER);
    if let Some(summary) = stderr
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix(marker.as_str()))
    {
        return Some(summary.trim().to_string());
    }
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
