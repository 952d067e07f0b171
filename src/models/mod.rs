//! 核心数据模型模块
//!
//! 定义 Wisdom Lenses 的核心数据结构：Hexagram, Perspective, UserMemo,
//! FlashCardProgress、暗记卡组以及函数调用记录，和对应的仓储。

pub mod catalog;
pub mod function_call;
pub mod hexagram;
pub mod hexagram_repository;
pub mod memo;
pub mod memo_repository;
pub mod memorize;
pub mod memorize_repository;
pub mod perspective;
pub mod progress;
pub mod progress_repository;

pub use function_call::*;
pub use hexagram::*;
pub use memo::*;
pub use perspective::*;
pub use progress::*;
