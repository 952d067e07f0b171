use crate::config::config::DatabaseConfig;
use crate::error::{AppError, Result};
use serde::Deserialize;
use std::sync::Arc;
use surrealdb::{
    Surreal,
    engine::any::{Any, connect},
    opt::auth::Root,
};
use tokio::sync::Mutex;

/// 表与索引定义
const SCHEMA: &str = r#"
DEFINE TABLE IF NOT EXISTS hexagram SCHEMALESS;
DEFINE INDEX IF NOT EXISTS hexagram_number ON TABLE hexagram FIELDS number UNIQUE;
DEFINE TABLE IF NOT EXISTS user_memo SCHEMALESS;
DEFINE INDEX IF NOT EXISTS user_memo_lookup ON TABLE user_memo FIELDS hexagram_number, username;
DEFINE TABLE IF NOT EXISTS flash_card_progress SCHEMALESS;
DEFINE INDEX IF NOT EXISTS flash_card_progress_key ON TABLE flash_card_progress FIELDS username, hexagram_number UNIQUE;
"#;

/// `SELECT count() ... GROUP ALL` 的结果行
#[derive(Debug, Deserialize)]
pub struct CountRow {
    pub count: u64,
}

/// SurrealDB 连接池
#[derive(Clone)]
pub struct SurrealPool {
    /// 数据库连接
    db: Arc<Mutex<Option<Surreal<Any>>>>,
    /// 连接配置
    config: DatabaseConfig,
}

impl SurrealPool {
    /// 创建新的连接池
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        let db: Surreal<Any> = connect(&config.url).await?;

        // 嵌入式引擎不需要认证
        if !config.username.is_empty() {
            db.signin(Root {
                username: &config.username,
                password: &config.password,
            })
            .await?;
        }

        // 选择命名空间和数据库
        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        db.query(SCHEMA).await?.check()?;

        tracing::info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "SurrealDB connected"
        );

        Ok(Self {
            db: Arc::new(Mutex::new(Some(db))),
            config,
        })
    }

    /// 获取内部数据库实例
    pub async fn inner(&self) -> Result<Surreal<Any>> {
        let guard = self.db.lock().await;
        guard
            .as_ref()
            .cloned()
            .ok_or_else(|| AppError::Connection("数据库连接已关闭".to_string()))
    }

    /// 连接配置
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// 探活
    pub async fn ping(&self) -> Result<()> {
        self.inner().await?.health().await?;
        Ok(())
    }

    /// 关闭连接
    pub async fn close(&self) {
        let mut guard = self.db.lock().await;
        *guard = None;
    }
}
