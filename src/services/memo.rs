//! 用户备忘服务
//!
//! 修改与删除需要用户名与编辑令牌都匹配。

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::hexagram::validate_hexagram_number;
use crate::models::memo::{MemoPage, MemoQuery, PublicMemo, UserMemo};
use crate::models::memo_repository::MemoRepository;

/// 备忘内容最大字符数
pub const MAX_MEMO_CHARS: usize = 2000;

/// 新建备忘的输入
#[derive(Debug, Clone, Default)]
pub struct NewMemo {
    pub username: String,
    pub password: String,
    pub hexagram_number: i64,
    pub memo: String,
}

/// 用户备忘服务 trait
#[async_trait]
pub trait MemoService: Send + Sync {
    /// 创建备忘
    async fn create(&self, input: NewMemo) -> Result<PublicMemo>;

    /// 分页列出备忘，最新在前
    async fn list(&self, query: &MemoQuery) -> Result<MemoPage>;

    /// 修改备忘内容
    async fn update(&self, id: &str, username: &str, password: &str, memo: &str) -> Result<PublicMemo>;

    /// 删除备忘
    async fn delete(&self, id: &str, username: &str, password: &str) -> Result<()>;
}

/// 用户备忘服务实现
pub struct MemoServiceImpl {
    repository: Arc<dyn MemoRepository>,
}

impl MemoServiceImpl {
    pub fn new(repository: Arc<dyn MemoRepository>) -> Self {
        Self { repository }
    }

    fn require(value: &str, field: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{}을(를) 입력해주세요.", field)));
        }
        Ok(())
    }

    fn check_memo(memo: &str) -> Result<()> {
        Self::require(memo, "메모")?;
        if memo.chars().count() > MAX_MEMO_CHARS {
            return Err(AppError::Validation(format!(
                "메모는 {}자를 넘을 수 없습니다.",
                MAX_MEMO_CHARS
            )));
        }
        Ok(())
    }

    /// 读取并校验归属
    async fn owned(&self, id: &str, username: &str, password: &str) -> Result<UserMemo> {
        Self::require(id, "메모 ID")?;
        Self::require(username, "사용자 이름")?;
        Self::require(password, "비밀번호")?;

        let memo = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("메모를 찾을 수 없습니다: {}", id)))?;
        if !memo.is_owned_by(username, password) {
            tracing::warn!(memo_id = %id, "Memo credentials mismatch");
            return Err(AppError::Forbidden("사용자 이름 또는 비밀번호가 일치하지 않습니다.".to_string()));
        }
        Ok(memo)
    }
}

#[async_trait]
impl MemoService for MemoServiceImpl {
    async fn create(&self, input: NewMemo) -> Result<PublicMemo> {
        Self::require(&input.username, "사용자 이름")?;
        Self::require(&input.password, "비밀번호")?;
        Self::check_memo(&input.memo)?;
        let number = validate_hexagram_number(input.hexagram_number)?;

        let memo = UserMemo::new(input.username.trim(), input.password, number, input.memo.trim());
        let created = self.repository.create(&memo).await?;
        tracing::info!(memo_id = %created.id, hexagram = number, "Memo created");
        Ok(created.to_public())
    }

    async fn list(&self, query: &MemoQuery) -> Result<MemoPage> {
        let memos = self.repository.list(query).await?;
        let total = self.repository.count(query).await?;
        Ok(MemoPage {
            memos: memos.iter().map(UserMemo::to_public).collect(),
            total,
            page: query.page(),
            page_size: query.page_size(),
        })
    }

    async fn update(&self, id: &str, username: &str, password: &str, memo: &str) -> Result<PublicMemo> {
        Self::check_memo(memo)?;
        let mut existing = self.owned(id, username, password).await?;
        existing.edit(memo.trim());

        let updated = self
            .repository
            .update(&existing)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("메모를 찾을 수 없습니다: {}", id)))?;
        tracing::info!(memo_id = %id, "Memo updated");
        Ok(updated.to_public())
    }

    async fn delete(&self, id: &str, username: &str, password: &str) -> Result<()> {
        self.owned(id, username, password).await?;
        if !self.repository.delete(id).await? {
            return Err(AppError::NotFound(format!("메모를 찾을 수 없습니다: {}", id)));
        }
        tracing::info!(memo_id = %id, "Memo deleted");
        Ok(())
    }
}

/// 创建用户备忘服务
pub fn create_memo_service(repository: Arc<dyn MemoRepository>) -> Arc<dyn MemoService> {
    Arc::new(MemoServiceImpl::new(repository))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::memo_repository::InMemoryMemoRepository;

    fn service() -> MemoServiceImpl {
        MemoServiceImpl::new(Arc::new(InMemoryMemoRepository::new()))
    }

    fn input(username: &str, number: i64, memo: &str) -> NewMemo {
        NewMemo {
            username: username.to_string(),
            password: "1234".to_string(),
            hexagram_number: number,
            memo: memo.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_list_hides_token() {
        let service = service();
        service.create(input("alice", 5, "기다림을 배우자")).await.unwrap();
        service.create(input("bob", 5, "인내")).await.unwrap();
        service.create(input("alice", 1, "시작")).await.unwrap();

        let page = service
            .list(&MemoQuery {
                hexagram_number: Some(5),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.page_size, 20);

        let json = serde_json::to_value(&page).unwrap();
        assert!(json["memos"][0].get("password").is_none());
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let service = service();
        assert!(matches!(
            service.create(input("alice", 0, "메모")).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.create(input(" ", 3, "메모")).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.create(input("alice", 3, &"가".repeat(MAX_MEMO_CHARS + 1))).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_requires_matching_token() {
        let service = service();
        let memo = service.create(input("alice", 5, "처음")).await.unwrap();

        assert!(matches!(
            service.update(&memo.id, "alice", "wrong", "수정").await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service.update(&memo.id, "mallory", "1234", "수정").await,
            Err(AppError::Forbidden(_))
        ));

        let updated = service.update(&memo.id, "alice", "1234", "수정").await.unwrap();
        assert_eq!(updated.memo, "수정");
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_delete_distinguishes_missing_and_forbidden() {
        let service = service();
        let memo = service.create(input("alice", 5, "지울 메모")).await.unwrap();

        assert!(matches!(
            service.delete("no-such-id", "alice", "1234").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(&memo.id, "alice", "0000").await,
            Err(AppError::Forbidden(_))
        ));

        service.delete(&memo.id, "alice", "1234").await.unwrap();
        assert_eq!(service.list(&MemoQuery::default()).await.unwrap().total, 0);
    }
}
