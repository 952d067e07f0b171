//! 闪卡进度服务

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::hexagram::validate_hexagram_number;
use crate::models::progress::{Difficulty, FlashCardProgress, ProgressReport, ProgressStats};
use crate::models::progress_repository::ProgressRepository;

/// 闪卡进度服务 trait
#[async_trait]
pub trait ProgressService: Send + Sync {
    /// 记录一次评级：首次创建，之后替换难度并累加次数
    async fn record(&self, username: &str, hexagram_number: i64, difficulty: Difficulty) -> Result<FlashCardProgress>;

    /// 查询用户进度，可按卦过滤
    async fn report(&self, username: &str, hexagram_number: Option<i64>) -> Result<ProgressReport>;
}

/// 闪卡进度服务实现
pub struct ProgressServiceImpl {
    repository: Arc<dyn ProgressRepository>,
}

impl ProgressServiceImpl {
    pub fn new(repository: Arc<dyn ProgressRepository>) -> Self {
        Self { repository }
    }

    fn require_username(username: &str) -> Result<&str> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::Validation("사용자 이름을 입력해주세요.".to_string()));
        }
        Ok(username)
    }
}

#[async_trait]
impl ProgressService for ProgressServiceImpl {
    async fn record(&self, username: &str, hexagram_number: i64, difficulty: Difficulty) -> Result<FlashCardProgress> {
        let username = Self::require_username(username)?;
        let number = validate_hexagram_number(hexagram_number)?;

        let progress = match self.repository.find(username, number).await? {
            Some(mut existing) => {
                existing.record_review(difficulty);
                existing
            }
            None => FlashCardProgress::first_review(username, number, difficulty),
        };

        let saved = self.repository.save(&progress).await?;
        tracing::debug!(
            username,
            hexagram = number,
            difficulty = %difficulty,
            review_count = saved.review_count,
            "Flashcard progress recorded"
        );
        Ok(saved)
    }

    async fn report(&self, username: &str, hexagram_number: Option<i64>) -> Result<ProgressReport> {
        let username = Self::require_username(username)?;
        let number = hexagram_number.map(validate_hexagram_number).transpose()?;

        let progress = self.repository.list_by_user(username, number).await?;
        let stats = ProgressStats::from_entries(&progress);
        Ok(ProgressReport { progress, stats })
    }
}

/// 创建闪卡进度服务
pub fn create_progress_service(repository: Arc<dyn ProgressRepository>) -> Arc<dyn ProgressService> {
    Arc::new(ProgressServiceImpl::new(repository))
}
