//! 存储工厂模块
//!
//! 根据配置创建相应的仓储实例。

use crate::config::config::{DatabaseConfig, StorageBackend};
use crate::error::Result;
use crate::models::hexagram_repository::{
    HexagramRepository, HexagramRepositoryImpl, InMemoryHexagramRepository,
};
use crate::models::memo_repository::{InMemoryMemoRepository, MemoRepository, MemoRepositoryImpl};
use crate::models::memorize_repository::{
    CardRepository, CardRepositoryImpl, InMemoryCardRepository, InMemorySubjectRepository,
    SubjectRepository, SubjectRepositoryImpl,
};
use crate::models::progress_repository::{
    InMemoryProgressRepository, ProgressRepository, ProgressRepositoryImpl,
};
use crate::storage::surrealdb::SurrealPool;
use std::sync::Arc;

/// 一组仓储实例
#[derive(Clone)]
pub struct Repositories {
    pub hexagrams: Arc<dyn HexagramRepository>,
    pub memos: Arc<dyn MemoRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub subjects: Arc<dyn SubjectRepository>,
    pub cards: Arc<dyn CardRepository>,
    /// 仅 SurrealDB 后端存在
    pub pool: Option<SurrealPool>,
}

impl Repositories {
    /// 进程内仓储
    pub fn in_memory() -> Self {
        Self {
            hexagrams: Arc::new(InMemoryHexagramRepository::new()),
            memos: Arc::new(InMemoryMemoRepository::new()),
            progress: Arc::new(InMemoryProgressRepository::new()),
            subjects: Arc::new(InMemorySubjectRepository::new()),
            cards: Arc::new(InMemoryCardRepository::new()),
            pool: None,
        }
    }

    /// 基于 SurrealDB 连接的仓储
    pub fn surreal(pool: SurrealPool) -> Self {
        Self {
            hexagrams: Arc::new(HexagramRepositoryImpl::new(pool.clone())),
            memos: Arc::new(MemoRepositoryImpl::new(pool.clone())),
            progress: Arc::new(ProgressRepositoryImpl::new(pool.clone())),
            subjects: Arc::new(SubjectRepositoryImpl::new(pool.clone())),
            cards: Arc::new(CardRepositoryImpl::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// 检查存储是否可用
    pub async fn health_check(&self) -> Result<bool> {
        match &self.pool {
            Some(pool) => pool.ping().await.map(|_| true),
            None => Ok(true),
        }
    }
}

/// 存储工厂
pub struct StorageFactory;

impl StorageFactory {
    /// 根据配置创建仓储
    pub async fn create(config: &DatabaseConfig) -> Result<Repositories> {
        match config.backend {
            StorageBackend::SurrealDB => {
                let pool = SurrealPool::new(config.clone()).await?;
                Ok(Repositories::surreal(pool))
            }
            StorageBackend::Memory => {
                tracing::info!("Using in-process storage backend");
                Ok(Repositories::in_memory())
            }
        }
    }
}
