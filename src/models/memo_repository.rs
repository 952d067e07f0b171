//! UserMemo 仓储

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::memo::{MemoQuery, UserMemo};
use crate::storage::surrealdb::{CountRow, SurrealPool};

/// UserMemo 仓储 trait
#[async_trait]
pub trait MemoRepository: Send + Sync {
    /// 创建备忘
    async fn create(&self, memo: &UserMemo) -> Result<UserMemo>;

    /// 根据 ID 获取备忘
    async fn get_by_id(&self, id: &str) -> Result<Option<UserMemo>>;

    /// 保存修改
    async fn update(&self, memo: &UserMemo) -> Result<Option<UserMemo>>;

    /// 删除备忘
    async fn delete(&self, id: &str) -> Result<bool>;

    /// 按条件分页查询，按创建时间倒序
    async fn list(&self, query: &MemoQuery) -> Result<Vec<UserMemo>>;

    /// 按条件统计数量
    async fn count(&self, query: &MemoQuery) -> Result<u64>;
}

/// 数据库中的备忘行，记录 ID 由数据库生成，业务 ID 单独存放
#[derive(Debug, Serialize, Deserialize)]
struct MemoRow {
    memo_id: String,
    username: String,
    password: String,
    hexagram_number: u8,
    memo: String,
    created_at: DateTime<Utc>,
    /// 排序用的毫秒时间戳
    created_ts: i64,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl From<&UserMemo> for MemoRow {
    fn from(memo: &UserMemo) -> Self {
        Self {
            memo_id: memo.id.clone(),
            username: memo.username.clone(),
            password: memo.password.clone(),
            hexagram_number: memo.hexagram_number,
            memo: memo.memo.clone(),
            created_at: memo.created_at,
            created_ts: memo.created_at.timestamp_millis(),
            updated_at: memo.updated_at,
        }
    }
}

impl From<MemoRow> for UserMemo {
    fn from(row: MemoRow) -> Self {
        Self {
            id: row.memo_id,
            username: row.username,
            password: row.password,
            hexagram_number: row.hexagram_number,
            memo: row.memo,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// UserMemo 仓储实现（SurrealDB）
#[derive(Clone)]
pub struct MemoRepositoryImpl {
    pool: SurrealPool,
}

impl MemoRepositoryImpl {
    pub fn new(pool: SurrealPool) -> Self {
        Self { pool }
    }

    /// 根据查询条件拼接 WHERE 子句，只引用已绑定的参数
    fn where_clause(query: &MemoQuery) -> String {
        let mut conditions = Vec::new();
        if query.hexagram_number.is_some() {
            conditions.push("hexagram_number = $hexagram_number");
        }
        if query.username.is_some() {
            conditions.push("username = $username");
        }
        if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        }
    }
}

#[async_trait]
impl MemoRepository for MemoRepositoryImpl {
    async fn create(&self, memo: &UserMemo) -> Result<UserMemo> {
        let db = self.pool.inner().await?;
        db.query("CREATE user_memo CONTENT $data RETURN NONE")
            .bind(("data", MemoRow::from(memo)))
            .await?
            .check()?;
        Ok(memo.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<UserMemo>> {
        let db = self.pool.inner().await?;
        let mut response = db
            .query("SELECT * OMIT id FROM user_memo WHERE memo_id = $memo_id LIMIT 1")
            .bind(("memo_id", id.to_string()))
            .await?;
        let rows: Vec<MemoRow> = response.take(0)?;
        Ok(rows.into_iter().next().map(UserMemo::from))
    }

    async fn update(&self, memo: &UserMemo) -> Result<Option<UserMemo>> {
        if self.get_by_id(&memo.id).await?.is_none() {
            return Ok(None);
        }
        let db = self.pool.inner().await?;
        db.query("UPDATE user_memo MERGE $data WHERE memo_id = $memo_id RETURN NONE")
            .bind(("memo_id", memo.id.clone()))
            .bind(("data", MemoRow::from(memo)))
            .await?
            .check()?;
        Ok(Some(memo.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        if self.get_by_id(id).await?.is_none() {
            return Ok(false);
        }
        let db = self.pool.inner().await?;
        db.query("DELETE user_memo WHERE memo_id = $memo_id")
            .bind(("memo_id", id.to_string()))
            .await?
            .check()?;
        Ok(true)
    }

    async fn list(&self, query: &MemoQuery) -> Result<Vec<UserMemo>> {
        let sql = format!(
            "SELECT * OMIT id FROM user_memo{} ORDER BY created_ts DESC LIMIT $limit START $start",
            Self::where_clause(query)
        );
        let db = self.pool.inner().await?;
        let mut request = db
            .query(sql)
            .bind(("limit", query.page_size() as i64))
            .bind(("start", i64::try_from(query.offset()).unwrap_or(i64::MAX)));
        if let Some(number) = query.hexagram_number {
            request = request.bind(("hexagram_number", number));
        }
        if let Some(username) = &query.username {
            request = request.bind(("username", username.clone()));
        }

        let mut response = request.await?;
        let rows: Vec<MemoRow> = response.take(0)?;
        Ok(rows.into_iter().map(UserMemo::from).collect())
    }

    async fn count(&self, query: &MemoQuery) -> Result<u64> {
        let sql = format!(
            "SELECT count() FROM user_memo{} GROUP ALL",
            Self::where_clause(query)
        );
        let db = self.pool.inner().await?;
        let mut request = db.query(sql);
        if let Some(number) = query.hexagram_number {
            request = request.bind(("hexagram_number", number));
        }
        if let Some(username) = &query.username {
            request = request.bind(("username", username.clone()));
        }

        let mut response = request.await?;
        let row: Option<CountRow> = response.take(0)?;
        Ok(row.map(|r| r.count).unwrap_or(0))
    }
}

/// UserMemo 仓储实现（进程内）
#[derive(Default)]
pub struct InMemoryMemoRepository {
    memos: DashMap<String, UserMemo>,
}

impl InMemoryMemoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn matching(&self, query: &MemoQuery) -> Vec<UserMemo> {
        let mut memos: Vec<UserMemo> = self
            .memos
            .iter()
            .filter(|e| query.matches(e.value()))
            .map(|e| e.value().clone())
            .collect();
        memos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        memos
    }
}

#[async_trait]
impl MemoRepository for InMemoryMemoRepository {
    async fn create(&self, memo: &UserMemo) -> Result<UserMemo> {
        self.memos.insert(memo.id.clone(), memo.clone());
        Ok(memo.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<UserMemo>> {
        Ok(self.memos.get(id).map(|e| e.value().clone()))
    }

    async fn update(&self, memo: &UserMemo) -> Result<Option<UserMemo>> {
        match self.memos.get_mut(&memo.id) {
            Some(mut entry) => {
                *entry = memo.clone();
                Ok(Some(memo.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.memos.remove(id).is_some())
    }

    async fn list(&self, query: &MemoQuery) -> Result<Vec<UserMemo>> {
        Ok(self
            .matching(query)
            .into_iter()
            .skip(query.offset())
            .take(query.page_size())
            .collect())
    }

    async fn count(&self, query: &MemoQuery) -> Result<u64> {
        Ok(self.matching(query).len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_in_memory_list_newest_first() {
        let repo = InMemoryMemoRepository::new();
        let mut older = UserMemo::new("kim", "pw", 5, "처음");
        older.created_at = Utc::now() - Duration::minutes(5);
        let newer = UserMemo::new("kim", "pw", 5, "나중");
        let other = UserMemo::new("lee", "pw", 6, "다른 괘");

        for memo in [&older, &newer, &other] {
            repo.create(memo).await.unwrap();
        }

        let query = MemoQuery {
            hexagram_number: Some(5),
            ..Default::default()
        };
        let listed = repo.list(&query).await.unwrap();
        assert_eq!(
            listed.iter().map(|m| m.memo.as_str()).collect::<Vec<_>>(),
            vec!["나중", "처음"]
        );
        assert_eq!(repo.count(&query).await.unwrap(), 2);
        assert_eq!(repo.count(&MemoQuery::default()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_in_memory_pagination() {
        let repo = InMemoryMemoRepository::new();
        for i in 0..5 {
            let mut memo = UserMemo::new("kim", "pw", 1, format!("memo {i}"));
            memo.created_at = Utc::now() - Duration::seconds(i);
            repo.create(&memo).await.unwrap();
        }

        let page = MemoQuery {
            page: 2,
            page_size: 2,
            ..Default::default()
        };
        let listed = repo.list(&page).await.unwrap();
        assert_eq!(
            listed.iter().map(|m| m.memo.as_str()).collect::<Vec<_>>(),
            vec!["memo 2", "memo 3"]
        );
    }

    #[tokio::test]
    async fn test_in_memory_huge_page_is_empty() {
        let repo = InMemoryMemoRepository::new();
        repo.create(&UserMemo::new("kim", "pw", 1, "memo")).await.unwrap();

        let page = MemoQuery {
            page: usize::MAX,
            ..Default::default()
        };
        assert!(repo.list(&page).await.unwrap().is_empty());
        assert_eq!(repo.count(&page).await.unwrap(), 1);
    }

    #[test]
    fn test_where_clause() {
        assert_eq!(MemoRepositoryImpl::where_clause(&MemoQuery::default()), "");
        let query = MemoQuery {
            hexagram_number: Some(3),
            username: Some("kim".into()),
            ..Default::default()
        };
        assert_eq!(
            MemoRepositoryImpl::where_clause(&query),
            " WHERE hexagram_number = $hexagram_number AND username = $username"
        );
    }
}
