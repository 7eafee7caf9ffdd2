use actix_web::{delete, get, post, web, HttpResponse};

use crate::{
    app_state::AppState,
    errors::AppError,
    models::dto::{request::SaveTemplateRequest, response::DeleteResponse},
};

#[get("/api/teachers/{teacher_id}/templates")]
pub async fn list_templates(
    state: web::Data<AppState>,
    teacher_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let templates = state.template_service.list_templates(&teacher_id).await?;
    Ok(HttpResponse::Ok().json(templates))
}

#[get("/api/templates/{id}")]
pub async fn get_template(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let template = state.template_service.get_template(&id).await?;
    Ok(HttpResponse::Ok().json(template))
}

#[post("/api/teachers/{teacher_id}/templates")]
pub async fn save_template(
    state: web::Data<AppState>,
    teacher_id: web::Path<String>,
    request: web::Json<SaveTemplateRequest>,
) -> Result<HttpResponse, AppError> {
    let creating = request.id.is_none();
    let template = state
        .template_service
        .save_template(request.into_inner(), &teacher_id)
        .await?;

    if creating {
        Ok(HttpResponse::Created().json(template))
    } else {
        Ok(HttpResponse::Ok().json(template))
    }
}

#[post("/api/teachers/{teacher_id}/templates/{id}/publish")]
pub async fn publish_template(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (teacher_id, id) = path.into_inner();
    let template = state
        .template_service
        .publish_template(&id, &teacher_id)
        .await?;
    Ok(HttpResponse::Ok().json(template))
}

#[delete("/api/teachers/{teacher_id}/templates/{id}")]
pub async fn delete_template(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (teacher_id, id) = path.into_inner();
    state
        .template_service
        .delete_template(&id, &teacher_id)
        .await?;
    Ok(HttpResponse::Ok().json(DeleteResponse {
        message: format!("Template '{}' deleted", id),
    }))
}
