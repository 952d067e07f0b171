//! 卦 DTO

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::Result;
use crate::models::hexagram::{Hexagram, validate_hexagram_number};
use crate::services::hexagram::{HexagramQuery, ImportSummary};

/// 列表查询参数
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ListHexagramsParams {
    /// 检索关键词
    pub keyword: Option<String>,
    /// 页码
    #[validate(range(min = 1, max = 10000, message = "페이지 번호는 1-10000 범위여야 합니다"))]
    pub page: Option<usize>,
    /// 每页条数（最大 64）
    pub limit: Option<usize>,
}

impl From<ListHexagramsParams> for HexagramQuery {
    fn from(params: ListHexagramsParams) -> Self {
        Self {
            keyword: params.keyword.filter(|k| !k.trim().is_empty()),
            page: params.page.unwrap_or(1),
            limit: params.limit.unwrap_or_default(),
        }
    }
}

/// 新增卦请求
#[derive(Debug, Deserialize, Validate)]
pub struct CreateHexagramRequest {
    #[validate(range(min = 1, max = 64, message = "괘 번호는 1-64 범위여야 합니다"))]
    pub number: i64,
    #[validate(length(min = 1))]
    pub symbol: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default, alias = "koreanName")]
    pub korean_name: Option<String>,
    #[validate(length(min = 1))]
    #[serde(alias = "coreViewpoint")]
    pub core_viewpoint: String,
    #[serde(default, alias = "mentalModels")]
    pub mental_models: Option<String>,
    #[validate(length(min = 1))]
    pub summary: String,
    /// 缺省时由卦名、核心观点与思维模型推导
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl CreateHexagramRequest {
    /// 转换为模型
    pub fn into_hexagram(self) -> Result<Hexagram> {
        let mut hexagram = Hexagram::new(
            validate_hexagram_number(self.number)?,
            self.symbol,
            self.name,
            self.core_viewpoint,
            self.summary,
        )
        .with_keywords(self.keywords);
        hexagram.korean_name = self.korean_name;
        hexagram.mental_models = self.mental_models;
        Ok(hexagram)
    }
}

/// Markdown 导入结果
#[derive(Debug, Serialize, Deserialize)]
pub struct ImportHexagramsResponse {
    /// 所有行都写入成功
    pub success: bool,
    #[serde(flatten)]
    pub summary: ImportSummary,
}

impl From<ImportSummary> for ImportHexagramsResponse {
    fn from(summary: ImportSummary) -> Self {
        Self {
            success: summary.errors.is_empty(),
            summary,
        }
    }
}

/// 删除结果
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteHexagramsResponse {
    pub deleted: u64,
}
