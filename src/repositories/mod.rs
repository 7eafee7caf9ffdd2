pub mod session_repository;
pub mod state_repository;

pub use session_repository::{RemoteSessionRepository, SessionRepository};
pub use state_repository::{AssessmentStateRepository, RemoteStateRepository};
