//! 用户备忘（UserMemo）模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::security::constant_time_eq;

/// 默认分页大小
pub const DEFAULT_MEMO_PAGE_SIZE: usize = 20;
/// 最大分页大小
pub const MAX_MEMO_PAGE_SIZE: usize = 100;

/// 用户对某一卦的备忘
///
/// `password` 是创建时设置的编辑令牌，修改与删除需要提供相同的用户名和令牌。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserMemo {
    /// 备忘 ID
    pub id: String,
    /// 用户名
    pub username: String,
    /// 编辑令牌
    pub password: String,
    /// 卦序号
    pub hexagram_number: u8,
    /// 备忘内容
    pub memo: String,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserMemo {
    /// 创建新备忘
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        hexagram_number: u8,
        memo: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username: username.into(),
            password: password.into(),
            hexagram_number,
            memo: memo.into(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// 用户名与编辑令牌是否匹配
    pub fn is_owned_by(&self, username: &str, password: &str) -> bool {
        self.username == username && constant_time_eq(self.password.as_bytes(), password.as_bytes())
    }

    /// 更新内容
    pub fn edit(&mut self, memo: impl Into<String>) {
        self.memo = memo.into();
        self.updated_at = Some(Utc::now());
    }

    /// 去掉编辑令牌后的公开视图
    pub fn to_public(&self) -> PublicMemo {
        PublicMemo {
            id: self.id.clone(),
            username: self.username.clone(),
            hexagram_number: self.hexagram_number,
            memo: self.memo.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// 对外返回的备忘（不含编辑令牌）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublicMemo {
    pub id: String,
    pub username: String,
    pub hexagram_number: u8,
    pub memo: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// 备忘查询条件
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoQuery {
    /// 按卦过滤
    pub hexagram_number: Option<u8>,
    /// 按用户过滤
    pub username: Option<String>,
    /// 页码（从 1 开始）
    pub page: usize,
    /// 每页条数
    pub page_size: usize,
}

impl MemoQuery {
    /// 规范化后的页码
    pub fn page(&self) -> usize {
        self.page.max(1)
    }

    /// 规范化后的每页条数
    pub fn page_size(&self) -> usize {
        match self.page_size {
            0 => DEFAULT_MEMO_PAGE_SIZE,
            n => n.min(MAX_MEMO_PAGE_SIZE),
        }
    }

    /// 偏移量，超大页码饱和而不是溢出
    pub fn offset(&self) -> usize {
        (self.page() - 1).saturating_mul(self.page_size())
    }

    /// 是否匹配该条件（不考虑分页）
    pub fn matches(&self, memo: &UserMemo) -> bool {
        self.hexagram_number
            .is_none_or(|number| memo.hexagram_number == number)
            && self
                .username
                .as_deref()
                .is_none_or(|username| memo.username == username)
    }
}

/// 备忘分页结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoPage {
    pub memos: Vec<PublicMemo>,
    pub total: u64,
    pub page: usize,
    pub page_size: usize,
}
