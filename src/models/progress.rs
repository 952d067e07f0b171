//! 闪卡学习进度模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// 复习难度评级
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// 需要马上再看
    Again,
    /// 近期复习
    Soon,
    /// 稍后复习
    Later,
    /// 已掌握
    Mastered,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Again,
        Difficulty::Soon,
        Difficulty::Later,
        Difficulty::Mastered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Again => "again",
            Difficulty::Soon => "soon",
            Difficulty::Later => "later",
            Difficulty::Mastered => "mastered",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str() == normalized)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "잘못된 난이도입니다: {} (again, soon, later, mastered 중 하나)",
                    s
                ))
            })
    }
}

/// 某用户对某一卦的复习进度
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlashCardProgress {
    pub username: String,
    pub hexagram_number: u8,
    pub difficulty: Difficulty,
    /// 评级次数，首次为 1
    pub review_count: u32,
    pub last_reviewed: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FlashCardProgress {
    /// 首次评级
    pub fn first_review(username: impl Into<String>, hexagram_number: u8, difficulty: Difficulty) -> Self {
        let now = Utc::now();
        Self {
            username: username.into(),
            hexagram_number,
            difficulty,
            review_count: 1,
            last_reviewed: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// 再次评级
    pub fn record_review(&mut self, difficulty: Difficulty) {
        let now = Utc::now();
        self.difficulty = difficulty;
        self.review_count = self.review_count.saturating_add(1);
        self.last_reviewed = now;
        self.updated_at = now;
    }
}

/// 进度统计
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressStats {
    pub total: usize,
    pub again: usize,
    pub soon: usize,
    pub later: usize,
    pub mastered: usize,
}

impl ProgressStats {
    pub fn from_entries(entries: &[FlashCardProgress]) -> Self {
        let mut stats = Self {
            total: entries.len(),
            ..Default::default()
        };
        for entry in entries {
            match entry.difficulty {
                Difficulty::Again => stats.again += 1,
                Difficulty::Soon => stats.soon += 1,
                Difficulty::Later => stats.later += 1,
                Difficulty::Mastered => stats.mastered += 1,
            }
        }
        stats
    }
}

/// 进度查询结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressReport {
    pub progress: Vec<FlashCardProgress>,
    pub stats: ProgressStats,
}
