//! Hexagram 仓储
//!
//! 提供卦目录的持久化服务：SurrealDB 实现与进程内实现。

use async_trait::async_trait;
use dashmap::DashMap;
use rand::seq::IteratorRandom;

use crate::error::Result;
use crate::models::hexagram::Hexagram;
use crate::storage::surrealdb::{CountRow, SurrealPool};

/// Hexagram 仓储 trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HexagramRepository: Send + Sync {
    /// 根据序号获取卦
    async fn find_by_number(&self, number: u8) -> Result<Option<Hexagram>>;

    /// 随机获取一卦
    async fn find_random(&self) -> Result<Option<Hexagram>>;

    /// 关键词检索，按序号升序
    async fn search_by_keyword(&self, keyword: &str) -> Result<Vec<Hexagram>>;

    /// 列出全部卦，按序号升序
    async fn find_all(&self) -> Result<Vec<Hexagram>>;

    /// 写入一卦
    async fn insert(&self, hexagram: &Hexagram) -> Result<Hexagram>;

    /// 批量写入，返回写入条数
    async fn insert_many(&self, hexagrams: &[Hexagram]) -> Result<usize>;

    /// 整体替换一卦，不存在时返回 None
    async fn update(&self, hexagram: &Hexagram) -> Result<Option<Hexagram>>;

    /// 按序号写入，存在则替换，不存在则创建
    async fn upsert(&self, hexagram: &Hexagram) -> Result<Hexagram>;

    /// 删除一卦，返回被删除的卦
    async fn delete(&self, number: u8) -> Result<Option<Hexagram>>;

    /// 清空卦库，返回删除条数
    async fn delete_all(&self) -> Result<u64>;

    /// 统计数量
    async fn count(&self) -> Result<u64>;
}

/// Hexagram 仓储实现（SurrealDB）
#[derive(Clone)]
pub struct HexagramRepositoryImpl {
    pool: SurrealPool,
}

impl HexagramRepositoryImpl {
    pub fn new(pool: SurrealPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HexagramRepository for HexagramRepositoryImpl {
    async fn find_by_number(&self, number: u8) -> Result<Option<Hexagram>> {
        let db = self.pool.inner().await?;
        let mut response = db
            .query("SELECT * OMIT id FROM hexagram WHERE number = $number LIMIT 1")
            .bind(("number", number))
            .await?;
        let rows: Vec<Hexagram> = response.take(0)?;
        Ok(rows.into_iter().next())
    }

    async fn find_random(&self) -> Result<Option<Hexagram>> {
        let db = self.pool.inner().await?;
        let mut response = db
            .query("SELECT * OMIT id FROM hexagram ORDER BY rand() LIMIT 1")
            .await?;
        let rows: Vec<Hexagram> = response.take(0)?;
        Ok(rows.into_iter().next())
    }

    async fn search_by_keyword(&self, keyword: &str) -> Result<Vec<Hexagram>> {
        // 卦库规模固定，过滤在应用侧完成
        let all = self.find_all().await?;
        Ok(all
            .into_iter()
            .filter(|h| h.matches_keyword(keyword))
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<Hexagram>> {
        let db = self.pool.inner().await?;
        let mut response = db
            .query("SELECT * OMIT id FROM hexagram ORDER BY number ASC")
            .await?;
        let rows: Vec<Hexagram> = response.take(0)?;
        Ok(rows)
    }

    async fn insert(&self, hexagram: &Hexagram) -> Result<Hexagram> {
        let db = self.pool.inner().await?;
        db.query("CREATE type::thing('hexagram', $number) CONTENT $data RETURN NONE")
            .bind(("number", hexagram.number))
            .bind(("data", hexagram.clone()))
            .await?
            .check()?;
        tracing::debug!(number = hexagram.number, "Hexagram inserted");
        Ok(hexagram.clone())
    }

    async fn insert_many(&self, hexagrams: &[Hexagram]) -> Result<usize> {
        for hexagram in hexagrams {
            self.insert(hexagram).await?;
        }
        Ok(hexagrams.len())
    }

    async fn update(&self, hexagram: &Hexagram) -> Result<Option<Hexagram>> {
        if self.find_by_number(hexagram.number).await?.is_none() {
            return Ok(None);
        }

        let db = self.pool.inner().await?;
        db.query("UPDATE type::thing('hexagram', $number) CONTENT $data RETURN NONE")
            .bind(("number", hexagram.number))
            .bind(("data", hexagram.clone()))
            .await?
            .check()?;
        self.find_by_number(hexagram.number).await
    }

    async fn upsert(&self, hexagram: &Hexagram) -> Result<Hexagram> {
        let db = self.pool.inner().await?;
        db.query("UPSERT type::thing('hexagram', $number) CONTENT $data RETURN NONE")
            .bind(("number", hexagram.number))
            .bind(("data", hexagram.clone()))
            .await?
            .check()?;
        tracing::debug!(number = hexagram.number, "Hexagram upserted");
        Ok(hexagram.clone())
    }

    async fn delete(&self, number: u8) -> Result<Option<Hexagram>> {
        let existing = self.find_by_number(number).await?;
        if existing.is_some() {
            let db = self.pool.inner().await?;
            db.query("DELETE hexagram WHERE number = $number")
                .bind(("number", number))
                .await?
                .check()?;
        }
        Ok(existing)
    }

    async fn delete_all(&self) -> Result<u64> {
        let total = self.count().await?;
        let db = self.pool.inner().await?;
        db.query("DELETE hexagram").await?.check()?;
        Ok(total)
    }

    async fn count(&self) -> Result<u64> {
        let db = self.pool.inner().await?;
        let mut response = db
            .query("SELECT count() FROM hexagram GROUP ALL")
            .await?;
        let row: Option<CountRow> = response.take(0)?;
        Ok(row.map(|r| r.count).unwrap_or(0))
    }
}

/// Hexagram 仓储实现（进程内）
#[derive(Default)]
pub struct InMemoryHexagramRepository {
    hexagrams: DashMap<u8, Hexagram>,
}

impl InMemoryHexagramRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(&self) -> Vec<Hexagram> {
        let mut all: Vec<Hexagram> = self.hexagrams.iter().map(|e| e.value().clone()).collect();
        all.sort_by_key(|h| h.number);
        all
    }
}

#[async_trait]
impl HexagramRepository for InMemoryHexagramRepository {
    async fn find_by_number(&self, number: u8) -> Result<Option<Hexagram>> {
        Ok(self.hexagrams.get(&number).map(|e| e.value().clone()))
    }

    async fn find_random(&self) -> Result<Option<Hexagram>> {
        let mut rng = rand::thread_rng();
        Ok(self
            .hexagrams
            .iter()
            .choose(&mut rng)
            .map(|e| e.value().clone()))
    }

    async fn search_by_keyword(&self, keyword: &str) -> Result<Vec<Hexagram>> {
        Ok(self
            .sorted()
            .into_iter()
            .filter(|h| h.matches_keyword(keyword))
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<Hexagram>> {
        Ok(self.sorted())
    }

    async fn insert(&self, hexagram: &Hexagram) -> Result<Hexagram> {
        self.hexagrams.insert(hexagram.number, hexagram.clone());
        Ok(hexagram.clone())
    }

    async fn insert_many(&self, hexagrams: &[Hexagram]) -> Result<usize> {
        for hexagram in hexagrams {
            self.hexagrams.insert(hexagram.number, hexagram.clone());
        }
        Ok(hexagrams.len())
    }

    async fn update(&self, hexagram: &Hexagram) -> Result<Option<Hexagram>> {
        match self.hexagrams.get_mut(&hexagram.number) {
            Some(mut entry) => {
                *entry = hexagram.clone();
                Ok(Some(hexagram.clone()))
            }
            None => Ok(None),
        }
    }

    async fn upsert(&self, hexagram: &Hexagram) -> Result<Hexagram> {
        self.hexagrams.insert(hexagram.number, hexagram.clone());
        Ok(hexagram.clone())
    }

    async fn delete(&self, number: u8) -> Result<Option<Hexagram>> {
        Ok(self.hexagrams.remove(&number).map(|(_, h)| h))
    }

    async fn delete_all(&self) -> Result<u64> {
        let total = self.hexagrams.len() as u64;
        self.hexagrams.clear();
        Ok(total)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.hexagrams.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hexagram(number: u8, name: &str, keywords: &[&str]) -> Hexagram {
        Hexagram::new(number, "☰/☰", name, format!("{name} 관점"), "요약")
            .with_keywords(keywords.iter().copied())
    }

    #[tokio::test]
    async fn test_in_memory_crud() {
        let repo = InMemoryHexagramRepository::new();
        repo.insert_many(&[
            hexagram(2, "중지곤", &["플랫폼"]),
            hexagram(1, "중천건", &["리더십"]),
        ])
        .await
        .unwrap();

        assert_eq!(repo.count().await.unwrap(), 2);
        let all = repo.find_all().await.unwrap();
        assert_eq!(all.iter().map(|h| h.number).collect::<Vec<_>>(), vec![1, 2]);

        let mut updated = all[0].clone();
        updated.summary = "새 요약".into();
        assert!(repo.update(&updated).await.unwrap().is_some());
        assert_eq!(
            repo.find_by_number(1).await.unwrap().unwrap().summary,
            "새 요약"
        );

        assert!(repo.update(&hexagram(9, "풍천소축", &[])).await.unwrap().is_none());
        assert!(repo.delete(2).await.unwrap().is_some());
        assert!(repo.delete(2).await.unwrap().is_none());
        assert_eq!(repo.delete_all().await.unwrap(), 1);
        assert!(repo.find_random().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_in_memory_upsert() {
        let repo = InMemoryHexagramRepository::new();
        repo.upsert(&hexagram(5, "수천수", &["기다림"])).await.unwrap();

        let mut changed = hexagram(5, "수천수", &["기다림"]);
        changed.summary = "때를 기다린다".into();
        repo.upsert(&changed).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 1);
        assert_eq!(
            repo.find_by_number(5).await.unwrap().unwrap().summary,
            "때를 기다린다"
        );
    }

    #[tokio::test]
    async fn test_in_memory_search_is_ordered() {
        let repo = InMemoryHexagramRepository::new();
        repo.insert_many(&[
            hexagram(30, "중화리", &["열정"]),
            hexagram(1, "중천건", &["리더십", "열정"]),
            hexagram(2, "중지곤", &["포용"]),
        ])
        .await
        .unwrap();

        let found = repo.search_by_keyword("열정").await.unwrap();
        assert_eq!(found.iter().map(|h| h.number).collect::<Vec<_>>(), vec![1, 30]);
    }
}
