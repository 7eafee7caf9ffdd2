pub mod attempt_service;
pub mod evaluator;
pub mod queue_service;
pub mod session_service;
pub mod snapshot_service;
pub mod template_service;

pub use attempt_service::AssessmentAttemptService;
pub use evaluator::AnswerEvaluator;
pub use queue_service::ContentQueueService;
pub use session_service::AssessmentSessionService;
pub use snapshot_service::TemplateSnapshotService;
pub use template_service::TemplateService;
