//! Handlers 模块
//!
//! HTTP 请求处理程序。

pub mod ai_handler;
pub mod hexagram_handler;
pub mod memo_handler;
pub mod memorize_handler;
pub mod progress_handler;

pub use ai_handler::*;
pub use hexagram_handler::*;
pub use memo_handler::*;
pub use memorize_handler::*;
pub use progress_handler::*;
