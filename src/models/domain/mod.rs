pub mod attempt;
pub mod coerce;
pub mod course_content;
pub mod session;
pub mod state;
pub mod template;

pub use attempt::{AssessmentAttempt, QuestionCheck, Score, TopicTally, UNASSIGNED_TOPIC};
pub use course_content::{ContentPayload, CourseContentItem, CourseMaterialBlock};
pub use session::{AssessmentSession, SessionMap, SESSION_TTL_DAYS};
pub use state::AssessmentsState;
pub use template::{
    AnswerSpec, AnswerType, AssessmentKind, ExpectedAnswer, FormatRules, Question,
    QuestionFeedback, QuestionPrompt, Recommendation, TemplateSnapshot, TemplateStatus,
    TestTemplate, Tolerance, ToleranceKind,
};
