//! API 模块
//!
//! 提供 REST API 支持，所有路由挂载在 `/api/v1` 下。

pub mod app_state;
pub mod dto;
pub mod handlers;
pub mod routes;

use std::time::Duration;

use axum::Router;
use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api::app_state::AppState;
use crate::config::config::ServerConfig;
use crate::observability::metrics_middleware;
use crate::security::middleware::{request_id_middleware, security_headers_middleware};

/// 按配置构造跨域层，来源列表为空时允许任意来源
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|_| tracing::warn!(%origin, "Ignoring invalid CORS origin"))
                .ok()
        })
        .collect();
    layer.allow_origin(origins)
}

pub fn create_router(app_state: AppState, server: &ServerConfig) -> Router {
    let api = Router::new()
        .merge(routes::hexagram_routes::create_hexagram_router())
        .merge(routes::ai_routes::create_ai_router())
        .merge(routes::memo_routes::create_memo_router())
        .merge(routes::memorize_routes::create_memorize_router())
        .merge(routes::progress_routes::create_progress_router());

    let metrics = app_state.metrics.clone();

    Router::new()
        .nest("/api/v1", api)
        .layer(TimeoutLayer::new(Duration::from_secs(server.request_timeout_secs)))
        .layer(axum::middleware::from_fn_with_state(metrics, metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        // Add security headers middleware to all routes
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(cors_layer(&server.cors_origins))
        .with_state(app_state)
}
