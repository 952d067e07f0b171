//! AI Routes
//!
//! 视角生成、函数调用与卦象推荐路由。

use axum::{
    Router,
    routing::{get, post},
};

use crate::api::app_state::AppState;
use crate::api::handlers::ai_handler::*;

/// 创建 AI 路由器
pub fn create_ai_router() -> Router<AppState> {
    Router::new()
        .route("/ai/perspectives", post(generate_perspectives))
        .route("/ai/function-calling", post(function_calling))
        .route("/ai/function-calling/first", post(function_calling_first))
        .route("/ai/function-calling/final", post(function_calling_final))
        .route("/ai/functions", get(list_functions))
        .route("/analyze", post(analyze))
}
