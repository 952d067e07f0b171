//! DTO 模块
//!
//! 数据传输对象，用于 API 请求和响应的序列化。

pub mod ai_dto;
pub mod hexagram_dto;
pub mod memo_dto;
pub mod memorize_dto;
pub mod progress_dto;

pub use ai_dto::*;
pub use hexagram_dto::*;
pub use memo_dto::*;
pub use memorize_dto::*;
pub use progress_dto::*;
