//! 暗记卡组 API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;
use validator::Validate;

use crate::{
    api::{app_state::AppState, dto::memorize_dto::*},
    error::AppError,
};

/// 列出全部主题
///
/// GET /api/v1/memorize/subjects
pub async fn list_subjects(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.memorize_service.list_subjects().await?))
}

/// 创建主题
///
/// POST /api/v1/memorize/subjects
pub async fn create_subject(
    State(state): State<AppState>,
    Json(request): Json<CreateSubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    debug!(name = %request.name, "Creating memorize subject");

    let subject = state
        .memorize_service
        .create_subject(&request.name, request.description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(subject)))
}

/// 获取单个主题
///
/// GET /api/v1/memorize/subjects/:id
pub async fn get_subject(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.memorize_service.get_subject(&id).await?))
}

/// 删除主题及其卡片
///
/// DELETE /api/v1/memorize/subjects/:id
pub async fn delete_subject(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.memorize_service.delete_subject(&id).await?;
    Ok(Json(MemorizeDeleteResponse {
        id,
        message: "주제가 성공적으로 삭제되었습니다.".to_string(),
    }))
}

/// 列出主题下的卡片
///
/// GET /api/v1/memorize/subjects/:id/cards
pub async fn list_cards(
    State(state): State<AppState>,
    Path(subject_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.memorize_service.list_cards(&subject_id).await?))
}

/// 在主题下创建卡片
///
/// POST /api/v1/memorize/subjects/:id/cards
pub async fn create_card(
    State(state): State<AppState>,
    Path(subject_id): Path<String>,
    Json(request): Json<CardRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let card = state
        .memorize_service
        .create_card(&subject_id, &request.question, &request.answer)
        .await?;
    Ok((StatusCode::CREATED, Json(card)))
}

/// 修改卡片
///
/// PUT /api/v1/memorize/cards/:id
pub async fn update_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CardRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    debug!(card_id = %id, "Updating memorize card");
    let card = state
        .memorize_service
        .update_card(&id, &request.question, &request.answer)
        .await?;
    Ok(Json(card))
}

/// 删除卡片
///
/// DELETE /api/v1/memorize/cards/:id
pub async fn delete_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.memorize_service.delete_card(&id).await?;
    Ok(Json(MemorizeDeleteResponse {
        id,
        message: "카드가 성공적으로 삭제되었습니다.".to_string(),
    }))
}
