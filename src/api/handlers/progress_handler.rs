//! 闪卡进度 API Handlers

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use tracing::debug;
use validator::Validate;

use crate::{
    api::{app_state::AppState, dto::progress_dto::*},
    error::AppError,
    models::progress::Difficulty,
};

/// 查询进度与统计
///
/// GET /api/v1/flashcards/progress
pub async fn get_progress(
    State(state): State<AppState>,
    Query(params): Query<ProgressParams>,
) -> Result<impl IntoResponse, AppError> {
    params.validate()?;
    debug!(username = %params.username, "Getting flashcard progress");

    let report = state
        .progress_service
        .report(&params.username, params.hexagram_number)
        .await?;
    Ok(Json(report))
}

/// 记录一次评级
///
/// POST /api/v1/flashcards/progress
pub async fn record_progress(
    State(state): State<AppState>,
    Json(request): Json<RecordProgressRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let difficulty: Difficulty = request.difficulty.parse()?;
    debug!(username = %request.username, hexagram = request.hexagram_number, %difficulty, "Recording progress");

    let progress = state
        .progress_service
        .record(&request.username, request.hexagram_number, difficulty)
        .await?;
    Ok(Json(progress))
}
