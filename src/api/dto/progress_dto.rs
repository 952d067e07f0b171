//! 闪卡进度 DTO

use serde::Deserialize;
use validator::Validate;

/// 进度查询参数
#[derive(Debug, Deserialize, Validate)]
pub struct ProgressParams {
    #[validate(length(min = 1, message = "username is required"))]
    #[serde(default)]
    pub username: String,
    #[serde(default, alias = "hexagramNumber")]
    pub hexagram_number: Option<i64>,
}

/// 记录评级请求
#[derive(Debug, Deserialize, Validate)]
pub struct RecordProgressRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[serde(alias = "hexagramNumber")]
    pub hexagram_number: i64,
    /// again | soon | later | mastered
    pub difficulty: String,
}
