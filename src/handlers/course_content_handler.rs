use actix_web::{delete, get, post, put, web, HttpResponse};

use crate::{
    app_state::AppState,
    errors::AppError,
    models::dto::{
        request::{
            AddTestItemRequest, CreateBlockRequest, MoveBlockRequest, MoveItemRequest,
            UpdateBlockRequest,
        },
        response::DeleteResponse,
    },
};

#[get("/api/courses/{course_id}/content")]
pub async fn get_course_content(
    state: web::Data<AppState>,
    course_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let content = state.queue_service.get_course_content(&course_id).await?;
    Ok(HttpResponse::Ok().json(content))
}

#[post("/api/courses/{course_id}/content/tests")]
pub async fn add_test_item(
    state: web::Data<AppState>,
    course_id: web::Path<String>,
    request: web::Json<AddTestItemRequest>,
) -> Result<HttpResponse, AppError> {
    let item = state
        .queue_service
        .add_test_item(&course_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(item))
}

#[delete("/api/courses/{course_id}/content/{item_id}")]
pub async fn remove_item(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (course_id, item_id) = path.into_inner();
    state.queue_service.remove_item(&course_id, &item_id).await?;
    Ok(HttpResponse::Ok().json(DeleteResponse {
        message: format!("Content item '{}' removed", item_id),
    }))
}

#[post("/api/courses/{course_id}/content/{item_id}/move")]
pub async fn move_item(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    request: web::Json<MoveItemRequest>,
) -> Result<HttpResponse, AppError> {
    let (course_id, item_id) = path.into_inner();
    let items = state
        .queue_service
        .move_item(&course_id, &item_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(items))
}

#[post("/api/courses/{course_id}/blocks")]
pub async fn create_block(
    state: web::Data<AppState>,
    course_id: web::Path<String>,
    request: web::Json<CreateBlockRequest>,
) -> Result<HttpResponse, AppError> {
    let block = state
        .queue_service
        .create_block(&course_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(block))
}

#[put("/api/courses/{course_id}/blocks/{block_id}")]
pub async fn update_block(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    request: web::Json<UpdateBlockRequest>,
) -> Result<HttpResponse, AppError> {
    let (course_id, block_id) = path.into_inner();
    let block = state
        .queue_service
        .update_block(&course_id, &block_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(block))
}

#[delete("/api/courses/{course_id}/blocks/{block_id}")]
pub async fn delete_block(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (course_id, block_id) = path.into_inner();
    state
        .queue_service
        .delete_block(&course_id, &block_id)
        .await?;
    Ok(HttpResponse::Ok().json(DeleteResponse {
        message: format!("Block '{}' deleted", block_id),
    }))
}

#[post("/api/courses/{course_id}/blocks/{block_id}/move")]
pub async fn move_block(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    request: web::Json<MoveBlockRequest>,
) -> Result<HttpResponse, AppError> {
    let (course_id, block_id) = path.into_inner();
    let blocks = state
        .queue_service
        .move_block(&course_id, &block_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(blocks))
}

#[delete("/api/courses/{course_id}/content")]
pub async fn delete_course_content(
    state: web::Data<AppState>,
    course_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    state
        .queue_service
        .delete_course_content(&course_id)
        .await?;
    Ok(HttpResponse::Ok().json(DeleteResponse {
        message: format!("Content for course '{}' deleted", course_id),
    }))
}
