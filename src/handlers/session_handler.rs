use actix_web::{delete, get, put, web, HttpResponse};

use crate::{
    app_state::AppState,
    errors::AppError,
    models::dto::{request::SaveSessionRequest, response::DeleteResponse},
};

#[get("/api/students/{student_id}/courses/{course_id}/items/{item_id}/session")]
pub async fn load_session(
    state: web::Data<AppState>,
    path: web::Path<(String, String, String)>,
) -> Result<HttpResponse, AppError> {
    let (student_id, course_id, item_id) = path.into_inner();
    let session = state
        .session_service
        .load_session(&student_id, &course_id, &item_id)
        .await?;

    match session {
        Some(session) => Ok(HttpResponse::Ok().json(session)),
        None => Ok(HttpResponse::NoContent().finish()),
    }
}

#[put("/api/sessions")]
pub async fn save_session(
    state: web::Data<AppState>,
    request: web::Json<SaveSessionRequest>,
) -> Result<HttpResponse, AppError> {
    let session = state
        .session_service
        .save_session(request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(session))
}

#[delete("/api/students/{student_id}/courses/{course_id}/items/{item_id}/session")]
pub async fn clear_session(
    state: web::Data<AppState>,
    path: web::Path<(String, String, String)>,
) -> Result<HttpResponse, AppError> {
    let (student_id, course_id, item_id) = path.into_inner();
    state
        .session_service
        .clear_session(&student_id, &course_id, &item_id)
        .await?;
    Ok(HttpResponse::Ok().json(DeleteResponse {
        message: "Session cleared".to_string(),
    }))
}
