//! Flashcard Routes

use axum::{Router, routing::get};

use crate::api::app_state::AppState;
use crate::api::handlers::progress_handler::*;

/// 创建闪卡进度路由器
pub fn create_progress_router() -> Router<AppState> {
    Router::new().route("/flashcards/progress", get(get_progress).post(record_progress))
}
