pub mod attempt_handler;
pub mod course_content_handler;
pub mod session_handler;
pub mod template_handler;

use actix_web::{get, HttpResponse};

#[get("/api/health")]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub use attempt_handler::{
    best_attempts, course_progress, get_attempts, knowledge_progress, latest_attempts,
    submit_attempt,
};
pub use course_content_handler::{
    add_test_item, create_block, delete_block, delete_course_content, get_course_content,
    move_block, move_item, remove_item, update_block,
};
pub use session_handler::{clear_session, load_session, save_session};
pub use template_handler::{
    delete_template, get_template, list_templates, publish_template, save_template,
};
