pub mod batch;
pub mod grading_result;

pub use batch::{is_supported_file, CacheEntry, FailureMarker, FileStatus, InputFile};
pub use grading_result::{
    ContentFeedback, FeedbackDetail, GradingResult, LanguageFeedback, Scores, SentenceCorrection,
};
