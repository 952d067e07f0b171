//! Hexagram Routes
//!
//! 定义卦相关的 API 路由。

use axum::{
    Router,
    routing::{get, post},
};

use crate::api::app_state::AppState;
use crate::api::handlers::hexagram_handler::*;

/// 创建卦路由器
pub fn create_hexagram_router() -> Router<AppState> {
    Router::new()
        .route(
            "/hexagrams",
            get(list_hexagrams)
                .post(create_hexagram)
                .delete(delete_all_hexagrams),
        )
        .route("/hexagrams/random", get(random_hexagram))
        .route("/hexagrams/seed", post(seed_hexagrams))
        .route("/hexagrams/import", post(import_hexagrams))
        .route(
            "/hexagrams/:number",
            get(get_hexagram).put(update_hexagram).delete(delete_hexagram),
        )
}
