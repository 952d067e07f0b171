//! Routes 模块
//!
//! 定义 API 路由。

pub mod ai_routes;
pub mod hexagram_routes;
pub mod memo_routes;
pub mod memorize_routes;
pub mod progress_routes;
