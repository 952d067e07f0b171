//! Memo Routes

use axum::{Router, routing::get};

use crate::api::app_state::AppState;
use crate::api::handlers::memo_handler::*;

/// 创建备忘路由器
pub fn create_memo_router() -> Router<AppState> {
    Router::new().route(
        "/memos",
        get(list_memos)
            .post(create_memo)
            .put(update_memo)
            .delete(delete_memo),
    )
}
