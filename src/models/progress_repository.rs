//! FlashCardProgress 仓储

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::Result;
use crate::models::progress::FlashCardProgress;
use crate::storage::surrealdb::SurrealPool;

/// FlashCardProgress 仓储 trait
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// 获取某用户对某一卦的进度
    async fn find(&self, username: &str, hexagram_number: u8) -> Result<Option<FlashCardProgress>>;

    /// 列出某用户的进度，可按卦过滤，按最近复习时间倒序
    async fn list_by_user(
        &self,
        username: &str,
        hexagram_number: Option<u8>,
    ) -> Result<Vec<FlashCardProgress>>;

    /// 按 (用户名, 卦序号) 写入或覆盖
    async fn save(&self, progress: &FlashCardProgress) -> Result<FlashCardProgress>;
}

fn newest_first(entries: &mut [FlashCardProgress]) {
    entries.sort_by(|a, b| b.last_reviewed.cmp(&a.last_reviewed));
}

/// FlashCardProgress 仓储实现（SurrealDB）
#[derive(Clone)]
pub struct ProgressRepositoryImpl {
    pool: SurrealPool,
}

impl ProgressRepositoryImpl {
    pub fn new(pool: SurrealPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProgressRepository for ProgressRepositoryImpl {
    async fn find(&self, username: &str, hexagram_number: u8) -> Result<Option<FlashCardProgress>> {
        let db = self.pool.inner().await?;
        let mut response = db
            .query(
                "SELECT * OMIT id FROM flash_card_progress \
                 WHERE username = $username AND hexagram_number = $hexagram_number LIMIT 1",
            )
            .bind(("username", username.to_string()))
            .bind(("hexagram_number", hexagram_number))
            .await?;
        let rows: Vec<FlashCardProgress> = response.take(0)?;
        Ok(rows.into_iter().next())
    }

    async fn list_by_user(
        &self,
        username: &str,
        hexagram_number: Option<u8>,
    ) -> Result<Vec<FlashCardProgress>> {
        let db = self.pool.inner().await?;
        let mut rows: Vec<FlashCardProgress> = match hexagram_number {
            Some(number) => db
                .query(
                    "SELECT * OMIT id FROM flash_card_progress \
                     WHERE username = $username AND hexagram_number = $hexagram_number",
                )
                .bind(("username", username.to_string()))
                .bind(("hexagram_number", number))
                .await?
                .take(0)?,
            None => db
                .query("SELECT * OMIT id FROM flash_card_progress WHERE username = $username")
                .bind(("username", username.to_string()))
                .await?
                .take(0)?,
        };
        newest_first(&mut rows);
        Ok(rows)
    }

    async fn save(&self, progress: &FlashCardProgress) -> Result<FlashCardProgress> {
        let db = self.pool.inner().await?;
        db.query(
            "UPSERT type::thing('flash_card_progress', [$username, $hexagram_number]) \
             CONTENT $data RETURN NONE",
        )
        .bind(("username", progress.username.clone()))
        .bind(("hexagram_number", progress.hexagram_number))
        .bind(("data", progress.clone()))
        .await?
        .check()?;
        Ok(progress.clone())
    }
}

/// FlashCardProgress 仓储实现（进程内）
#[derive(Default)]
pub struct InMemoryProgressRepository {
    entries: DashMap<(String, u8), FlashCardProgress>,
}

impl InMemoryProgressRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressRepository for InMemoryProgressRepository {
    async fn find(&self, username: &str, hexagram_number: u8) -> Result<Option<FlashCardProgress>> {
        Ok(self
            .entries
            .get(&(username.to_string(), hexagram_number))
            .map(|e| e.value().clone()))
    }

    async fn list_by_user(
        &self,
        username: &str,
        hexagram_number: Option<u8>,
    ) -> Result<Vec<FlashCardProgress>> {
        let mut rows: Vec<FlashCardProgress> = self
            .entries
            .iter()
            .filter(|e| {
                e.value().username == username
                    && hexagram_number.is_none_or(|n| e.value().hexagram_number == n)
            })
            .map(|e| e.value().clone())
            .collect();
        newest_first(&mut rows);
        Ok(rows)
    }

    async fn save(&self, progress: &FlashCardProgress) -> Result<FlashCardProgress> {
        self.entries.insert(
            (progress.username.clone(), progress.hexagram_number),
            progress.clone(),
        );
        Ok(progress.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::progress::Difficulty;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_in_memory_save_is_keyed_by_user_and_number() {
        let repo = InMemoryProgressRepository::new();
        let mut progress = FlashCardProgress::first_review("kim", 5, Difficulty::Again);
        repo.save(&progress).await.unwrap();

        progress.record_review(Difficulty::Mastered);
        repo.save(&progress).await.unwrap();

        let stored = repo.find("kim", 5).await.unwrap().unwrap();
        assert_eq!(stored.review_count, 2);
        assert_eq!(repo.list_by_user("kim", None).await.unwrap().len(), 1);
        assert!(repo.find("lee", 5).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_in_memory_list_orders_by_last_review() {
        let repo = InMemoryProgressRepository::new();
        let mut old = FlashCardProgress::first_review("kim", 1, Difficulty::Soon);
        old.last_reviewed = Utc::now() - Duration::days(1);
        let recent = FlashCardProgress::first_review("kim", 2, Difficulty::Later);
        repo.save(&old).await.unwrap();
        repo.save(&recent).await.unwrap();

        let listed = repo.list_by_user("kim", None).await.unwrap();
        assert_eq!(
            listed.iter().map(|p| p.hexagram_number).collect::<Vec<_>>(),
            vec![2, 1]
        );

        let filtered = repo.list_by_user("kim", Some(1)).await.unwrap();
        assert_eq!(filtered.len(), 1);
    }
}
