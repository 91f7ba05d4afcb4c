pub mod failure_writer;
pub mod grading_service;
pub mod rubric;

pub use failure_writer::FailureWriter;
pub use grading_service::{parse_grading_response, strip_code_fences, Grader, LlmGradingService};
