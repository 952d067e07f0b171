//! 备忘 DTO

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::memo::MemoQuery;
use crate::services::memo::NewMemo;

/// 列表查询参数
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ListMemosParams {
    #[serde(alias = "hexagramNumber")]
    pub hexagram_number: Option<u8>,
    pub username: Option<String>,
    #[validate(range(min = 1, max = 10000, message = "페이지 번호는 1-10000 범위여야 합니다"))]
    pub page: Option<usize>,
    #[serde(alias = "pageSize")]
    pub page_size: Option<usize>,
}

impl From<ListMemosParams> for MemoQuery {
    fn from(params: ListMemosParams) -> Self {
        Self {
            hexagram_number: params.hexagram_number,
            username: params.username.filter(|u| !u.trim().is_empty()),
            page: params.page.unwrap_or(1),
            page_size: params.page_size.unwrap_or_default(),
        }
    }
}

/// 创建备忘请求
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMemoRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 100))]
    pub password: String,
    #[serde(alias = "hexagramNumber")]
    pub hexagram_number: i64,
    #[validate(length(min = 1))]
    pub memo: String,
}

impl From<CreateMemoRequest> for NewMemo {
    fn from(request: CreateMemoRequest) -> Self {
        Self {
            username: request.username,
            password: request.password,
            hexagram_number: request.hexagram_number,
            memo: request.memo,
        }
    }
}

/// 修改备忘请求
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMemoRequest {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[validate(length(min = 1))]
    pub memo: String,
}

/// 删除备忘请求
#[derive(Debug, Deserialize, Validate)]
pub struct DeleteMemoRequest {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// 删除结果
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteMemoResponse {
    pub id: String,
    pub deleted: bool,
}
