pub mod request;
pub mod response;

pub use request::{FallbackSubmissionRequest, QuizTriggerRequest};
pub use response::{HealthResponse, QuizAcceptedResponse, ServiceInfoResponse};
