//! 卦目录服务
//!
//! 查询、检索、分页与管理操作。所有序号在访问存储之前校验。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::catalog::{CatalogRow, parse_markdown_catalog, seed_catalog};
use crate::models::hexagram::{Hexagram, HexagramUpdate, MAX_HEXAGRAM_NUMBER, validate_hexagram_number};
use crate::models::hexagram_repository::HexagramRepository;

/// 每页最大条数
pub const MAX_PAGE_LIMIT: usize = MAX_HEXAGRAM_NUMBER as usize;

/// 列表查询参数
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HexagramQuery {
    /// 关键词（为空时列出全部）
    pub keyword: Option<String>,
    /// 页码（从 1 开始）
    pub page: usize,
    /// 每页条数，0 表示全部
    pub limit: usize,
}

impl HexagramQuery {
    fn page(&self) -> usize {
        self.page.max(1)
    }

    fn limit(&self) -> usize {
        match self.limit {
            0 => MAX_PAGE_LIMIT,
            n => n.min(MAX_PAGE_LIMIT),
        }
    }

    /// 偏移量，超大页码饱和而不是溢出
    fn offset(&self) -> usize {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

/// 列表结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HexagramPage {
    pub hexagrams: Vec<Hexagram>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

/// 重建卦库的结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeedSummary {
    pub deleted: u64,
    pub inserted: usize,
}

/// Markdown 导入中失败的一行
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportRowError {
    pub number: i64,
    pub error: String,
}

/// Markdown 导入结果
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImportSummary {
    /// 成功写入的行数
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    pub errors: Vec<ImportRowError>,
}

/// 卦目录服务 trait
#[async_trait]
pub trait HexagramService: Send + Sync {
    /// 按序号获取
    async fn get(&self, number: i64) -> Result<Hexagram>;

    /// 随机获取一卦
    async fn random(&self) -> Result<Hexagram>;

    /// 列表或关键词检索
    async fn list(&self, query: &HexagramQuery) -> Result<HexagramPage>;

    /// 新增一卦
    async fn create(&self, hexagram: Hexagram) -> Result<Hexagram>;

    /// 部分更新
    async fn update(&self, number: i64, update: HexagramUpdate) -> Result<Hexagram>;

    /// 删除一卦
    async fn delete(&self, number: i64) -> Result<Hexagram>;

    /// 清空卦库
    async fn delete_all(&self) -> Result<u64>;

    /// 用内置的 64 卦替换整个卦库
    async fn seed(&self) -> Result<SeedSummary>;

    /// 从 Markdown 表格逐行写入，已有的卦保留关键词与视角
    async fn import_markdown(&self, markdown: &str) -> Result<ImportSummary>;
}

/// 卦目录服务实现
pub struct HexagramServiceImpl {
    repository: Arc<dyn HexagramRepository>,
}

impl HexagramServiceImpl {
    pub fn new(repository: Arc<dyn HexagramRepository>) -> Self {
        Self { repository }
    }

    fn not_found(number: u8) -> AppError {
        AppError::NotFound(format!("{}번 괘를 찾을 수 없습니다.", number))
    }

    /// 写入一行，返回是否新建
    async fn import_row(&self, row: &CatalogRow) -> Result<bool> {
        let number = validate_hexagram_number(row.number)?;
        let (mut hexagram, created) = match self.repository.find_by_number(number).await? {
            Some(existing) => (existing, false),
            None => (Hexagram::new(number, "", "", "", ""), true),
        };
        row.apply_to(&mut hexagram);
        hexagram.validate()?;
        hexagram.ensure_keywords();

        self.repository.upsert(&hexagram).await?;
        Ok(created)
    }
}

#[async_trait]
impl HexagramService for HexagramServiceImpl {
    async fn get(&self, number: i64) -> Result<Hexagram> {
        let number = validate_hexagram_number(number)?;
        self.repository
            .find_by_number(number)
            .await?
            .ok_or_else(|| Self::not_found(number))
    }

    async fn random(&self) -> Result<Hexagram> {
        self.repository
            .find_random()
            .await?
            .ok_or_else(|| AppError::NotFound("괘 데이터가 없습니다.".to_string()))
    }

    async fn list(&self, query: &HexagramQuery) -> Result<HexagramPage> {
        let keyword = query.keyword.as_deref().map(str::trim).unwrap_or_default();
        let all = if keyword.is_empty() {
            self.repository.find_all().await?
        } else {
            self.repository.search_by_keyword(keyword).await?
        };

        let (page, limit) = (query.page(), query.limit());
        let total = all.len();
        let hexagrams = all.into_iter().skip(query.offset()).take(limit).collect();

        tracing::debug!(keyword, page, limit, total, "Hexagrams listed");
        Ok(HexagramPage {
            hexagrams,
            total,
            page,
            limit,
        })
    }

    async fn create(&self, mut hexagram: Hexagram) -> Result<Hexagram> {
        hexagram.validate()?;
        if self.repository.find_by_number(hexagram.number).await?.is_some() {
            return Err(AppError::Validation(format!(
                "{}번 괘가 이미 존재합니다.",
                hexagram.number
            )));
        }
        hexagram.ensure_keywords();

        let created = self.repository.insert(&hexagram).await?;
        tracing::info!(number = created.number, "Hexagram created");
        Ok(created)
    }

    async fn update(&self, number: i64, update: HexagramUpdate) -> Result<Hexagram> {
        let number = validate_hexagram_number(number)?;
        if update.is_empty() {
            return Err(AppError::Validation("수정할 수 있는 필드가 없습니다.".to_string()));
        }

        let mut hexagram = self
            .repository
            .find_by_number(number)
            .await?
            .ok_or_else(|| Self::not_found(number))?;
        update.apply_to(&mut hexagram);
        hexagram.validate()?;

        let updated = self
            .repository
            .update(&hexagram)
            .await?
            .ok_or_else(|| Self::not_found(number))?;
        tracing::info!(number, "Hexagram updated");
        Ok(updated)
    }

    async fn delete(&self, number: i64) -> Result<Hexagram> {
        let number = validate_hexagram_number(number)?;
        let deleted = self
            .repository
            .delete(number)
            .await?
            .ok_or_else(|| Self::not_found(number))?;
        tracing::info!(number, "Hexagram deleted");
        Ok(deleted)
    }

    async fn delete_all(&self) -> Result<u64> {
        let deleted = self.repository.delete_all().await?;
        tracing::warn!(deleted, "Hexagram catalog cleared");
        Ok(deleted)
    }

    async fn seed(&self) -> Result<SeedSummary> {
        let catalog = seed_catalog()?;
        let deleted = self.repository.delete_all().await?;
        let inserted = self.repository.insert_many(&catalog).await?;

        tracing::info!(deleted, inserted, "Hexagram catalog seeded");
        Ok(SeedSummary { deleted, inserted })
    }

    async fn import_markdown(&self, markdown: &str) -> Result<ImportSummary> {
        let rows = parse_markdown_catalog(markdown);
        if rows.is_empty() {
            return Err(AppError::Validation(
                "Markdown에서 괘 데이터를 찾을 수 없거나 표 형식이 올바르지 않습니다.".to_string(),
            ));
        }

        let mut summary = ImportSummary::default();
        for row in &rows {
            match self.import_row(row).await {
                Ok(true) => summary.created += 1,
                Ok(false) => summary.updated += 1,
                Err(e) => {
                    tracing::warn!(number = row.number, error = %e, "Markdown row rejected");
                    summary.errors.push(ImportRowError {
                        number: row.number,
                        error: e.to_string(),
                    });
                }
            }
        }
        summary.processed = summary.created + summary.updated;

        tracing::info!(
            processed = summary.processed,
            created = summary.created,
            updated = summary.updated,
            errors = summary.errors.len(),
            "Hexagram catalog imported from markdown"
        );
        Ok(summary)
    }
}

/// 创建卦目录服务
pub fn create_hexagram_service(repository: Arc<dyn HexagramRepository>) -> Arc<dyn HexagramService> {
    Arc::new(HexagramServiceImpl::new(repository))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::hexagram_repository::{InMemoryHexagramRepository, MockHexagramRepository};
    use crate::models::perspective::{Perspective, PerspectiveKind};
    use rstest::rstest;

    async fn seeded() -> HexagramServiceImpl {
        let service = HexagramServiceImpl::new(Arc::new(InMemoryHexagramRepository::new()));
        service.seed().await.unwrap();
        service
    }

    #[rstest]
    #[case(0)]
    #[case(65)]
    #[case(-3)]
    #[tokio::test]
    async fn test_out_of_range_numbers_never_reach_store(#[case] number: i64) {
        let mut repository = MockHexagramRepository::new();
        repository.expect_find_by_number().never();
        repository.expect_update().never();
        repository.expect_delete().never();
        let service = HexagramServiceImpl::new(Arc::new(repository));

        assert!(matches!(service.get(number).await, Err(AppError::Validation(_))));
        assert!(matches!(
            service
                .update(
                    number,
                    HexagramUpdate {
                        summary: Some("새 요약".into()),
                        ..Default::default()
                    }
                )
                .await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(service.delete(number).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_get_and_missing() {
        let service = seeded().await;
        assert_eq!(service.get(1).await.unwrap().name, "중천건");

        service.delete(1).await.unwrap();
        assert!(matches!(service.get(1).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_seed_replaces_catalog() {
        let service = seeded().await;
        service.delete(10).await.unwrap();

        let summary = service.seed().await.unwrap();
        assert_eq!(summary, SeedSummary { deleted: 63, inserted: 64 });
        assert_eq!(service.list(&HexagramQuery::default()).await.unwrap().total, 64);
    }

    #[tokio::test]
    async fn test_list_paginates_and_caps_limit() {
        let service = seeded().await;

        let page = service
            .list(&HexagramQuery {
                page: 2,
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.hexagrams.len(), 10);
        assert_eq!(page.hexagrams[0].number, 11);

        let capped = service
            .list(&HexagramQuery {
                limit: 500,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(capped.limit, MAX_PAGE_LIMIT);
        assert_eq!(capped.hexagrams.len(), 64);
    }

    #[tokio::test]
    async fn test_list_with_huge_page_is_empty() {
        let service = seeded().await;
        let page = service
            .list(&HexagramQuery {
                page: usize::MAX,
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(page.hexagrams.is_empty());
        assert_eq!(page.total, 64);
        assert_eq!(page.page, usize::MAX);
    }

    #[tokio::test]
    async fn test_import_markdown_upserts_rows() {
        let service = seeded().await;
        let mut waiting = service.get(5).await.unwrap();
        let kept_keywords = waiting.keywords.clone();
        waiting.perspectives.set(
            PerspectiveKind::Physics,
            Perspective {
                title: "물리학 관점".into(),
                content: "위치 에너지".into(),
                key_message: "기다림".into(),
                questions: vec!["언제?".into()],
            },
        );
        service.repository.update(&waiting).await.unwrap();
        service.delete(9).await.unwrap();

        let markdown = "| 번호 | 기호 | 이름 | 핵심 관점 | 멘탈 모델 | 요약 |
|---|---|---|---|---|---|
| 5 | ☵/☰ | 수천수（水天需） | 타이밍의 관점 | 옵션 가치 | 때를 기다린다 |
| 9 | ☴/☰ | 풍천소축（風天小畜） | 작은 축적의 관점 | - | 조금씩 쌓는다 |
| 70 | ☰/☰ | 없는 괘 | 관점 | - | 요약 |
| 10 | ☰/☱ | 천택리 |  | - | 핵심 관점 없음 |
";
        let summary = service.import_markdown(markdown).await.unwrap();
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.created, 1);
        assert_eq!(
            summary.errors.iter().map(|e| e.number).collect::<Vec<_>>(),
            vec![70, 10]
        );

        let updated = service.get(5).await.unwrap();
        assert_eq!(updated.core_viewpoint, "타이밍의 관점");
        assert_eq!(updated.korean_name.as_deref(), Some("水天需"));
        assert_eq!(updated.mental_models.as_deref(), Some("옵션 가치"));
        assert_eq!(updated.keywords, kept_keywords);
        assert!(updated.perspectives.get(PerspectiveKind::Physics).is_some());

        let created = service.get(9).await.unwrap();
        assert_eq!(created.name, "풍천소축");
        assert!(created.keywords.iter().any(|k| k == "풍천소축"));

        // 핵심 관점이 빈 행은 기존 괘를 건드리지 않는다
        assert_ne!(service.get(10).await.unwrap().core_viewpoint, "");
    }

    #[tokio::test]
    async fn test_import_markdown_without_table_is_rejected() {
        let service = seeded().await;
        assert!(matches!(
            service.import_markdown("# 제목만 있는 문서").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_list_by_keyword() {
        let service = seeded().await;
        let page = service
            .list(&HexagramQuery {
                keyword: Some("기다림".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(page.hexagrams.iter().any(|h| h.number == 5));
        assert!(page.hexagrams.windows(2).all(|w| w[0].number < w[1].number));
    }

    #[tokio::test]
    async fn test_create_defaults_keywords_and_rejects_duplicates() {
        let service = HexagramServiceImpl::new(Arc::new(InMemoryHexagramRepository::new()));
        let created = service
            .create(Hexagram::new(
                5,
                "☵/☰",
                "수천수",
                "전략적 기다림의 관점",
                "때를 기다린다",
            ))
            .await
            .unwrap();
        assert_eq!(created.keywords, vec!["수천수", "전략적", "기다림의", "관점"]);

        let duplicate = service
            .create(Hexagram::new(5, "☵/☰", "수천수", "관점", "요약"))
            .await;
        assert!(matches!(duplicate, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_is_allow_listed() {
        let service = seeded().await;
        let before = service.get(2).await.unwrap();

        assert!(matches!(
            service.update(2, HexagramUpdate::default()).await,
            Err(AppError::Validation(_))
        ));

        let updated = service
            .update(
                2,
                HexagramUpdate {
                    summary: Some("받아들이는 힘".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.summary, "받아들이는 힘");
        assert_eq!(updated.name, before.name);
        assert!(updated.updated_at >= before.updated_at);
    }

    #[tokio::test]
    async fn test_random_on_empty_store() {
        let service = HexagramServiceImpl::new(Arc::new(InMemoryHexagramRepository::new()));
        assert!(matches!(service.random().await, Err(AppError::NotFound(_))));
    }
}
