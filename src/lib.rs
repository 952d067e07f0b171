//! Wisdom Lenses - 易经闪卡与多视角 AI 解读服务
//!
//! 以六个固定视角（古代智慧、物理、生物、经营、心理、军事）解读六十四卦，
//! 并通过函数调用让生成模型查询本地卦库。

pub mod api;
pub mod config;
pub mod error;
pub mod generation;
pub mod models;
pub mod observability;
pub mod security;
pub mod services;
pub mod storage;
