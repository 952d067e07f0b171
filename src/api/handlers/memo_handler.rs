//! 备忘 API Handlers

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;
use validator::Validate;

use crate::{
    api::{app_state::AppState, dto::memo_dto::*},
    error::AppError,
    models::memo::MemoQuery,
};

/// 分页列出备忘
///
/// GET /api/v1/memos
pub async fn list_memos(
    State(state): State<AppState>,
    Query(params): Query<ListMemosParams>,
) -> Result<impl IntoResponse, AppError> {
    params.validate()?;
    debug!(hexagram = ?params.hexagram_number, "Listing memos");
    Ok(Json(state.memo_service.list(&MemoQuery::from(params)).await?))
}

/// 创建备忘
///
/// POST /api/v1/memos
pub async fn create_memo(
    State(state): State<AppState>,
    Json(request): Json<CreateMemoRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    debug!(hexagram = request.hexagram_number, "Creating memo");

    let memo = state.memo_service.create(request.into()).await?;
    Ok((StatusCode::CREATED, Json(memo)))
}

/// 修改备忘
///
/// PUT /api/v1/memos
pub async fn update_memo(
    State(state): State<AppState>,
    Json(request): Json<UpdateMemoRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    debug!(memo_id = %request.id, "Updating memo");

    let memo = state
        .memo_service
        .update(&request.id, &request.username, &request.password, &request.memo)
        .await?;
    Ok(Json(memo))
}

/// 删除备忘
///
/// DELETE /api/v1/memos
pub async fn delete_memo(
    State(state): State<AppState>,
    Json(request): Json<DeleteMemoRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    debug!(memo_id = %request.id, "Deleting memo");

    state
        .memo_service
        .delete(&request.id, &request.username, &request.password)
        .await?;
    Ok(Json(DeleteMemoResponse {
        id: request.id,
        deleted: true,
    }))
}
