//! AI DTO
//!
//! 视角生成、函数调用与卦象推荐的请求和响应。

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::generation::FunctionDeclaration;
use crate::models::function_call::{FunctionCall, FunctionCallResult};
use crate::models::perspective::{PerspectiveKind, PerspectiveSet};
use crate::services::advisor::AdviceRequest;
use crate::services::perspective::{HexagramBrief, PerspectiveBatch};

/// 视角生成请求
#[derive(Debug, Deserialize, Validate)]
pub struct PerspectiveRequest {
    #[serde(alias = "hexagramNumber")]
    pub hexagram_number: i64,
    #[validate(length(min = 1, message = "사용자 상황을 입력해주세요"))]
    #[serde(alias = "userSituation")]
    pub user_situation: String,
    /// 视角名；缺省或 `all` 表示全部
    #[serde(default)]
    pub perspective: Option<String>,
}

/// 全部视角的响应
#[derive(Debug, Serialize)]
pub struct AllPerspectivesResponse {
    pub perspectives: PerspectiveSet,
    pub failed: Vec<PerspectiveKind>,
    pub hexagram: HexagramBrief,
}

impl From<PerspectiveBatch> for AllPerspectivesResponse {
    fn from(batch: PerspectiveBatch) -> Self {
        let mut perspectives = PerspectiveSet::default();
        for (kind, perspective) in batch.perspectives {
            perspectives.set(kind, perspective);
        }
        Self {
            perspectives,
            failed: batch.failed,
            hexagram: batch.hexagram,
        }
    }
}

/// 函数调用请求
#[derive(Debug, Deserialize, Validate)]
pub struct FunctionCallingRequest {
    #[validate(length(min = 1, message = "프롬프트를 입력해주세요"))]
    pub prompt: String,
}

/// 第一轮响应
#[derive(Debug, Serialize)]
pub struct FirstRoundResponse {
    pub prompt: String,
    /// 模型直接给出的回答
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    pub function_calls: Vec<FunctionCall>,
    pub needs_function_execution: bool,
    /// 由服务端执行后的结果，供客户端转交第二轮
    pub function_results: Vec<FunctionCallResult>,
}

/// 第二轮请求
#[derive(Debug, Deserialize, Validate)]
pub struct FinalRoundRequest {
    #[validate(length(min = 1, message = "프롬프트를 입력해주세요"))]
    pub prompt: String,
    #[serde(default, alias = "functionResults")]
    pub function_results: Vec<FunctionCallResult>,
}

/// 第二轮响应
#[derive(Debug, Serialize)]
pub struct FinalRoundResponse {
    pub prompt: String,
    pub final_response: String,
}

/// 可调用函数列表
#[derive(Debug, Serialize)]
pub struct FunctionsResponse {
    pub functions: Vec<FunctionDeclaration>,
}

/// 推荐请求的附加上下文
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserContext {
    #[serde(alias = "hexagramNumber")]
    pub hexagram_number: Option<i64>,
    /// 两枚八面骰的点数
    pub dice: Option<[u8; 2]>,
}

/// 卦象推荐请求
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default, alias = "userSituation")]
    pub user_situation: String,
    #[serde(default, alias = "userContext")]
    pub user_context: Option<UserContext>,
}

impl From<AnalyzeRequest> for AdviceRequest {
    fn from(request: AnalyzeRequest) -> Self {
        let context = request.user_context.unwrap_or_default();
        Self {
            situation: request.user_situation,
            hexagram_number: context.hexagram_number,
            dice: context.dice.map(|[first, second]| (first, second)),
        }
    }
}
