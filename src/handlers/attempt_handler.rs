use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;

use crate::{
    app_state::AppState,
    errors::AppError,
    models::dto::request::{ProgressRequest, SubmitAttemptRequest},
};

#[post("/api/attempts")]
pub async fn submit_attempt(
    state: web::Data<AppState>,
    request: web::Json<SubmitAttemptRequest>,
) -> Result<HttpResponse, AppError> {
    let response = state
        .attempt_service
        .submit_attempt(request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(response))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptsQuery {
    pub test_item_id: Option<String>,
}

#[get("/api/students/{student_id}/courses/{course_id}/attempts")]
pub async fn get_attempts(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    query: web::Query<AttemptsQuery>,
) -> Result<HttpResponse, AppError> {
    let (student_id, course_id) = path.into_inner();
    let attempts = state
        .attempt_service
        .get_attempts(&student_id, &course_id, query.test_item_id.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(attempts))
}

#[get("/api/students/{student_id}/courses/{course_id}/attempts/latest")]
pub async fn latest_attempts(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (student_id, course_id) = path.into_inner();
    let map = state
        .attempt_service
        .latest_attempts_map(&student_id, &course_id)
        .await?;
    Ok(HttpResponse::Ok().json(map))
}

#[get("/api/students/{student_id}/courses/{course_id}/attempts/best")]
pub async fn best_attempts(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (student_id, course_id) = path.into_inner();
    let map = state
        .attempt_service
        .best_attempts_map(&student_id, &course_id)
        .await?;
    Ok(HttpResponse::Ok().json(map))
}

#[post("/api/students/{student_id}/courses/{course_id}/progress")]
pub async fn course_progress(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    request: web::Json<ProgressRequest>,
) -> Result<HttpResponse, AppError> {
    let (student_id, course_id) = path.into_inner();
    let progress = state
        .attempt_service
        .course_progress(&student_id, &course_id, &request.test_item_ids)
        .await?;
    Ok(HttpResponse::Ok().json(progress))
}

#[post("/api/students/{student_id}/courses/{course_id}/knowledge")]
pub async fn knowledge_progress(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    request: web::Json<ProgressRequest>,
) -> Result<HttpResponse, AppError> {
    let (student_id, course_id) = path.into_inner();
    let progress = state
        .attempt_service
        .knowledge_progress(&student_id, &course_id, &request.test_item_ids)
        .await?;
    Ok(HttpResponse::Ok().json(progress))
}
