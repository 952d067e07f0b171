//! 卦 API Handlers
//!
//! 卦目录的查询、维护与重建。

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;
use validator::Validate;

use crate::{
    api::{app_state::AppState, dto::hexagram_dto::*},
    error::AppError,
    models::hexagram::HexagramUpdate,
    services::hexagram::HexagramQuery,
};

/// 列表或关键词检索
///
/// GET /api/v1/hexagrams
pub async fn list_hexagrams(
    State(state): State<AppState>,
    Query(params): Query<ListHexagramsParams>,
) -> Result<impl IntoResponse, AppError> {
    params.validate()?;
    debug!(keyword = ?params.keyword, page = ?params.page, limit = ?params.limit, "Listing hexagrams");
    let page = state.hexagram_service.list(&HexagramQuery::from(params)).await?;
    Ok(Json(page))
}

/// 随机一卦
///
/// GET /api/v1/hexagrams/random
pub async fn random_hexagram(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let hexagram = state.hexagram_service.random().await?;
    debug!(number = hexagram.number, "Random hexagram drawn");
    Ok(Json(hexagram))
}

/// 按序号获取
///
/// GET /api/v1/hexagrams/:number
pub async fn get_hexagram(
    State(state): State<AppState>,
    Path(number): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    debug!(number, "Getting hexagram");
    Ok(Json(state.hexagram_service.get(number).await?))
}

/// 新增一卦
///
/// POST /api/v1/hexagrams
pub async fn create_hexagram(
    State(state): State<AppState>,
    Json(request): Json<CreateHexagramRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    debug!(number = request.number, "Creating hexagram");

    let created = state
        .hexagram_service
        .create(request.into_hexagram()?)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// 部分更新；只接受白名单字段
///
/// PUT /api/v1/hexagrams/:number
pub async fn update_hexagram(
    State(state): State<AppState>,
    Path(number): Path<i64>,
    Json(update): Json<HexagramUpdate>,
) -> Result<impl IntoResponse, AppError> {
    debug!(number, "Updating hexagram");
    Ok(Json(state.hexagram_service.update(number, update).await?))
}

/// 删除一卦
///
/// DELETE /api/v1/hexagrams/:number
pub async fn delete_hexagram(
    State(state): State<AppState>,
    Path(number): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    debug!(number, "Deleting hexagram");
    Ok(Json(state.hexagram_service.delete(number).await?))
}

/// 清空卦库
///
/// DELETE /api/v1/hexagrams
pub async fn delete_all_hexagrams(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let deleted = state.hexagram_service.delete_all().await?;
    Ok(Json(DeleteHexagramsResponse { deleted }))
}

/// 从 Markdown 表格导入；请求体为 Markdown 原文
///
/// POST /api/v1/hexagrams/import
pub async fn import_hexagrams(
    State(state): State<AppState>,
    markdown: String,
) -> Result<impl IntoResponse, AppError> {
    debug!(bytes = markdown.len(), "Importing hexagrams from markdown");
    let summary = state.hexagram_service.import_markdown(&markdown).await?;
    Ok(Json(ImportHexagramsResponse::from(summary)))
}

/// 用内置目录重建卦库
///
/// POST /api/v1/hexagrams/seed
pub async fn seed_hexagrams(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let summary = state.hexagram_service.seed().await?;
    Ok((StatusCode::CREATED, Json(summary)))
}
