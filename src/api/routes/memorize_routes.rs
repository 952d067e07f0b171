//! Memorize Routes

use axum::{
    Router,
    routing::{get, put},
};

use crate::api::app_state::AppState;
use crate::api::handlers::memorize_handler::*;

/// 创建暗记卡组路由器
pub fn create_memorize_router() -> Router<AppState> {
    Router::new()
        .route("/memorize/subjects", get(list_subjects).post(create_subject))
        .route(
            "/memorize/subjects/:id",
            get(get_subject).delete(delete_subject),
        )
        .route(
            "/memorize/subjects/:id/cards",
            get(list_cards).post(create_card),
        )
        .route("/memorize/cards/:id", put(update_card).delete(delete_card))
}
