//! 卦（Hexagram）模型
//!
//! 六十四卦的目录条目、字段白名单更新以及默认关键词提取。

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::perspective::PerspectiveSet;

/// 最小卦序号
pub const MIN_HEXAGRAM_NUMBER: u8 = 1;
/// 最大卦序号
pub const MAX_HEXAGRAM_NUMBER: u8 = 64;

/// 默认关键词的分词规则（韩文音节与单词字符）
static WORD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x{AC00}-\x{D7AF}\w]+").expect("valid word pattern"));

/// 校验卦序号，合法区间为 [1, 64]
pub fn validate_hexagram_number(number: i64) -> Result<u8> {
    if (MIN_HEXAGRAM_NUMBER as i64..=MAX_HEXAGRAM_NUMBER as i64).contains(&number) {
        Ok(number as u8)
    } else {
        Err(AppError::Validation(format!(
            "괘 번호는 {}-{} 범위여야 합니다: {}",
            MIN_HEXAGRAM_NUMBER, MAX_HEXAGRAM_NUMBER, number
        )))
    }
}

/// 卦
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hexagram {
    /// 序号 1-64，唯一
    pub number: u8,
    /// 卦符
    pub symbol: String,
    /// 卦名
    pub name: String,
    /// 韩文名称
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub korean_name: Option<String>,
    /// 核心观点
    pub core_viewpoint: String,
    /// 思维模型
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mental_models: Option<String>,
    /// 摘要
    pub summary: String,
    /// 关键词（用于检索与相容性评分）
    #[serde(default)]
    pub keywords: Vec<String>,
    /// 已保存的视角
    #[serde(default, skip_serializing_if = "PerspectiveSet::is_empty")]
    pub perspectives: PerspectiveSet,
    /// 创建时间
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// 更新时间
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Hexagram {
    /// 创建新卦
    pub fn new(
        number: u8,
        symbol: impl Into<String>,
        name: impl Into<String>,
        core_viewpoint: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            number,
            symbol: symbol.into(),
            name: name.into(),
            korean_name: None,
            core_viewpoint: core_viewpoint.into(),
            mental_models: None,
            summary: summary.into(),
            keywords: Vec::new(),
            perspectives: PerspectiveSet::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// 设置关键词
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// 设置思维模型
    pub fn with_mental_models(mut self, mental_models: impl Into<String>) -> Self {
        self.mental_models = Some(mental_models.into());
        self
    }

    /// 校验必填字段
    pub fn validate(&self) -> Result<()> {
        validate_hexagram_number(self.number as i64)?;

        let required = [
            ("symbol", &self.symbol),
            ("name", &self.name),
            ("core_viewpoint", &self.core_viewpoint),
            ("summary", &self.summary),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("{} 필드는 비어 있을 수 없습니다", field)));
            }
        }
        Ok(())
    }

    /// 由卦名、核心观点与思维模型推导默认关键词（保序去重）
    pub fn default_keywords(&self) -> Vec<String> {
        let mut keywords: Vec<String> = Vec::new();
        let mut push = |word: &str| {
            let word = word.trim();
            if !word.is_empty() && !keywords.iter().any(|k| k == word) {
                keywords.push(word.to_string());
            }
        };

        push(self.name.as_str());
        for source in [Some(&self.core_viewpoint), self.mental_models.as_ref()]
            .into_iter()
            .flatten()
        {
            for word in WORD_PATTERN.find_iter(source) {
                push(word.as_str());
            }
        }
        keywords
    }

    /// 关键词为空时填充默认关键词
    pub fn ensure_keywords(&mut self) {
        if self.keywords.is_empty() {
            self.keywords = self.default_keywords();
        }
    }

    /// 忽略大小写地匹配卦名、核心观点、摘要或任一关键词
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return false;
        }

        [&self.name, &self.core_viewpoint, &self.summary]
            .into_iter()
            .any(|field| field.to_lowercase().contains(&needle))
            || self
                .keywords
                .iter()
                .any(|k| k.to_lowercase().contains(&needle))
    }
}

/// 卦的部分更新，只包含允许修改的字段
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HexagramUpdate {
    pub name: Option<String>,
    pub korean_name: Option<String>,
    pub core_viewpoint: Option<String>,
    pub mental_models: Option<String>,
    pub summary: Option<String>,
    pub keywords: Option<Vec<String>>,
}

impl HexagramUpdate {
    /// 是否没有任何可更新字段
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.korean_name.is_none()
            && self.core_viewpoint.is_none()
            && self.mental_models.is_none()
            && self.summary.is_none()
            && self.keywords.is_none()
    }

    /// 应用到卦上并刷新更新时间
    pub fn apply_to(self, hexagram: &mut Hexagram) {
        if let Some(name) = self.name {
            hexagram.name = name;
        }
        if let Some(korean_name) = self.korean_name {
            hexagram.korean_name = Some(korean_name);
        }
        if let Some(core_viewpoint) = self.core_viewpoint {
            hexagram.core_viewpoint = core_viewpoint;
        }
        if let Some(mental_models) = self.mental_models {
            hexagram.mental_models = Some(mental_models);
        }
        if let Some(summary) = self.summary {
            hexagram.summary = summary;
        }
        if let Some(keywords) = self.keywords {
            hexagram.keywords = keywords;
        }
        hexagram.updated_at = Utc::now();
    }
}
