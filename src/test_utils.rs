use secrecy::SecretString;

use crate::models::domain::{Credentials, ExecutionResult, QuestionData, SubmissionVerdict};

#[cfg(test)]
pub mod fixtures {
    use super::*;

    pub const QUIZ_URL: &str = "https://quiz.example/q1";

    pub fn credentials() -> Credentials {
        Credentials::new(
            "student@example.com",
            SecretString::from("test-secret".to_string()),
        )
    }

    /// Question as the page fetcher would return it for `url`.
    pub fn question(url: &str) -> QuestionData {
        QuestionData::new(
            format!("Question at {}", url),
            format!("<html><body><p>Question at {}</p></body></html>", url),
            url,
        )
    }

    /// A run that printed a graded submission.
    pub fn graded(correct: bool, next_url: Option<&str>) -> ExecutionResult {
        let mut verdict = SubmissionVerdict::scanned()
            .with_correct(correct)
            .with_status_code(200);
        if let Some(url) = next_url {
            verdict = verdict.with_next_url(url);
        }
        ExecutionResult::success(verdict.to_string(), verdict)
    }

    /// A run that printed output without any recognisable verdict.
    pub fn ungraded() -> ExecutionResult {
        ExecutionResult::success("computed 42\n", SubmissionVerdict::scanned())
    }

    /// A run that printed nothing at all.
    pub fn silent() -> ExecutionResult {
        ExecutionResult::success("", SubmissionVerdict::empty())
    }

    /// A run that raised `error_message`.
    pub fn crashed(error_message: &str) -> ExecutionResult {
        ExecutionResult::failure(
            "",
            error_message,
            Some(format!("Traceback (most recent call last):\n{}", error_message)),
            SubmissionVerdict::empty(),
        )
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }

    /// Asserts that a status code represents success (2xx)
    pub fn assert_success_status(status: StatusCode) {
        assert!(
            status.is_success(),
            "Expected success status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn graded_fixture_round_trips_through_display() {
        let result = graded(false, Some("https://quiz.example/q2"));

        assert!(result.succeeded);
        assert_eq!(result.submission.correct, Some(false));
        assert!(result.captured_output.contains("REQUEST_STATUS: 200"));
        assert!(result.captured_output.contains("https://quiz.example/q2"));
    }

    #[test]
    fn silent_and_ungraded_fixtures_differ() {
        assert!(silent().submission.is_empty());
        assert!(!ungraded().submission.is_empty());
        assert_eq!(ungraded().submission.correct, None);
    }

    #[test]
    fn crashed_fixture_is_failure() {
        let result = crashed("ValueError: bad");

        assert!(!result.succeeded);
        assert_eq!(result.error_summary(), "ValueError: bad");
    }
}
