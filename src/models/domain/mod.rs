pub mod credentials;
pub mod outcome;
pub mod question;
pub mod submission;
pub use credentials::Credentials;
pub use outcome::{OutcomeStatus, QuestionOutcome, SequenceStats};
pub use question::{QuestionData, RetryFeedback};
pub use submission::{ExecutionResult, SubmissionVerdict};
