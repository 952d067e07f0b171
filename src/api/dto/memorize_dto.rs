//! 暗记卡组 DTO

use serde::{Deserialize, Serialize};
use validator::Validate;

/// 创建主题请求
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubjectRequest {
    #[validate(length(max = 100, message = "주제 이름은 100자를 넘을 수 없습니다"))]
    pub name: String,
    pub description: Option<String>,
}

/// 创建或修改卡片请求
#[derive(Debug, Deserialize, Validate)]
pub struct CardRequest {
    pub question: String,
    pub answer: String,
}

/// 删除结果
#[derive(Debug, Serialize)]
pub struct MemorizeDeleteResponse {
    pub id: String,
    pub message: String,
}
