//! 暗记卡组模型
//!
//! 用户自定义的主题（Subject）以及主题下的问答卡片（Card）。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 主题
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subject {
    /// 主题 ID
    pub id: String,
    /// 主题名称，唯一
    pub name: String,
    /// 说明
    #[serde(default)]
    pub description: String,
    /// 卡片数量，读取时统计
    #[serde(default)]
    pub card_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subject {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            card_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_card_count(mut self, card_count: u64) -> Self {
        self.card_count = card_count;
        self
    }
}

/// 问答卡片
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Card {
    /// 卡片 ID
    pub id: String,
    /// 所属主题
    pub subject_id: String,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    pub fn new(
        subject_id: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            subject_id: subject_id.into(),
            question: question.into(),
            answer: answer.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// 替换问题与答案
    pub fn edit(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.question = question.into();
        self.answer = answer.into();
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_edit_touches_updated_at() {
        let mut card = Card::new("subject", "1+1?", "2");
        let created = card.updated_at;
        card.edit("2+2?", "4");
        assert_eq!(card.question, "2+2?");
        assert_eq!(card.answer, "4");
        assert!(card.updated_at >= created);
        assert_eq!(card.created_at, created);
    }

    #[test]
    fn test_subject_wire_shape() {
        let subject = Subject::new("한자", "기초 한자").with_card_count(3);
        let json = serde_json::to_value(&subject).unwrap();
        assert_eq!(json["name"], "한자");
        assert_eq!(json["card_count"], 3);
    }
}
