//! 视角生成服务
//!
//! 为一卦和用户处境生成单个或全部六个视角。

pub mod parser;
pub mod prompt;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::config::AiConfig;
use crate::error::{AppError, Result};
use crate::generation::{GenerationConfig, GenerationRequest, TextGenerator};
use crate::models::hexagram::{Hexagram, validate_hexagram_number};
use crate::models::hexagram_repository::HexagramRepository;
use crate::models::perspective::{Perspective, PerspectiveKind};
use crate::observability::AppMetrics;

pub use parser::{ParsedResponse, parse_response};
pub use prompt::build_prompt;

/// 请求中引用的卦摘要
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HexagramBrief {
    pub number: u8,
    pub name: String,
    pub symbol: String,
    pub core_viewpoint: String,
}

impl From<&Hexagram> for HexagramBrief {
    fn from(hexagram: &Hexagram) -> Self {
        Self {
            number: hexagram.number,
            name: hexagram.name.clone(),
            symbol: hexagram.symbol.clone(),
            core_viewpoint: hexagram.core_viewpoint.clone(),
        }
    }
}

/// 单个视角的生成结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerspectiveResult {
    pub perspective: PerspectiveKind,
    pub analysis: Perspective,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unparsed: Option<String>,
    pub hexagram: HexagramBrief,
}

/// 全部视角的生成结果，按固定顺序排列
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerspectiveBatch {
    pub perspectives: Vec<(PerspectiveKind, Perspective)>,
    /// 生成失败、使用占位记录的视角
    pub failed: Vec<PerspectiveKind>,
    pub hexagram: HexagramBrief,
}

impl PerspectiveBatch {
    pub fn get(&self, kind: PerspectiveKind) -> Option<&Perspective> {
        self.perspectives
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, p)| p)
    }
}

/// 视角生成服务
pub struct PerspectiveService {
    generator: Arc<dyn TextGenerator>,
    hexagrams: Arc<dyn HexagramRepository>,
    metrics: Arc<AppMetrics>,
    model: String,
    config: GenerationConfig,
    system_instruction: Option<String>,
    delay: Duration,
}

impl PerspectiveService {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        hexagrams: Arc<dyn HexagramRepository>,
        metrics: Arc<AppMetrics>,
        ai: &AiConfig,
    ) -> Self {
        Self {
            generator,
            hexagrams,
            metrics,
            model: ai.model.clone(),
            config: GenerationConfig::from_ai_config(ai),
            system_instruction: ai.system_instruction.clone(),
            delay: Duration::from_millis(ai.perspective_delay_ms),
        }
    }

    async fn load(&self, number: i64, situation: &str) -> Result<Hexagram> {
        let number = validate_hexagram_number(number)?;
        if situation.trim().is_empty() {
            return Err(AppError::Validation("사용자 상황을 입력해주세요.".to_string()));
        }
        self.hexagrams
            .find_by_number(number)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{}번 괘를 찾을 수 없습니다.", number)))
    }

    async fn generate_one(
        &self,
        kind: PerspectiveKind,
        hexagram: &Hexagram,
        situation: &str,
    ) -> Result<ParsedResponse> {
        let request =
            GenerationRequest::prompt(&self.model, build_prompt(kind, hexagram, situation))
                .with_config(self.config.clone())
                .with_system_instruction(self.system_instruction.clone());

        self.metrics.record_generation_call();
        let text = match self.generator.generate(&request).await {
            Ok(output) => output.into_text(),
            Err(e) => Err(e),
        }
        .inspect_err(|_| self.metrics.record_generation_failure())?;

        let parsed = parse_response(&text, kind);
        if parsed.used_fallback {
            self.metrics.record_parser_fallback();
            tracing::debug!(perspective = %kind, "Perspective parsed with fallbacks");
        }
        Ok(parsed)
    }

    /// 生成单个视角，生成失败时返回错误
    pub async fn generate_single(
        &self,
        number: i64,
        situation: &str,
        kind: PerspectiveKind,
    ) -> Result<PerspectiveResult> {
        let hexagram = self.load(number, situation).await?;
        let parsed = self.generate_one(kind, &hexagram, situation).await?;

        tracing::info!(number = hexagram.number, perspective = %kind, "Perspective generated");
        Ok(PerspectiveResult {
            perspective: kind,
            analysis: parsed.perspective,
            unparsed: parsed.unparsed,
            hexagram: HexagramBrief::from(&hexagram),
        })
    }

    /// 依次生成全部六个视角，单个视角失败时用占位记录代替
    pub async fn generate_all(&self, number: i64, situation: &str) -> Result<PerspectiveBatch> {
        let hexagram = self.load(number, situation).await?;
        let mut perspectives = Vec::with_capacity(PerspectiveKind::ALL.len());
        let mut failed = Vec::new();

        for (index, kind) in PerspectiveKind::ALL.into_iter().enumerate() {
            if index > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            match self.generate_one(kind, &hexagram, situation).await {
                Ok(parsed) => perspectives.push((kind, parsed.perspective)),
                Err(e) => {
                    tracing::warn!(perspective = %kind, error = %e, "Perspective generation failed");
                    failed.push(kind);
                    perspectives.push((kind, Perspective::generation_failed(kind)));
                }
            }
        }

        tracing::info!(
            number = hexagram.number,
            failed = failed.len(),
            "All perspectives generated"
        );
        Ok(PerspectiveBatch {
            perspectives,
            failed,
            hexagram: HexagramBrief::from(&hexagram),
        })
    }

    /// 按名称生成：`all` 或缺省为全部视角，否则为单个视角
    pub async fn generate(
        &self,
        number: i64,
        situation: &str,
        perspective: Option<&str>,
    ) -> Result<PerspectiveResponse> {
        match perspective.map(str::trim) {
            None | Some("") | Some("all") => self
                .generate_all(number, situation)
                .await
                .map(PerspectiveResponse::All),
            Some(name) => {
                let kind: PerspectiveKind = name.parse()?;
                self.generate_single(number, situation, kind)
                    .await
                    .map(PerspectiveResponse::Single)
            }
        }
    }
}

/// 按名称生成的结果
#[derive(Debug, Clone, PartialEq)]
pub enum PerspectiveResponse {
    Single(PerspectiveResult),
    All(PerspectiveBatch),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config::AppConfig;
    use crate::generation::{GenerationOutput, MockTextGenerator};
    use crate::models::hexagram_repository::InMemoryHexagramRepository;

    const PHYSICS_REPLY: &str = "**물리학 관점**\n\n관성을 이용하라.\n\n**핵심 메시지**: 작은 힘을 꾸준히\n\n**전략적 질문**:\n1. 가\n2. 나\n3. 다";

    async fn repository() -> Arc<dyn HexagramRepository> {
        let repo = InMemoryHexagramRepository::new();
        repo.insert(
            &Hexagram::new(5, "☵/☰", "수천수", "전략적 기다림의 관점", "때를 기다린다")
                .with_keywords(["기다림", "인내"]),
        )
        .await
        .unwrap();
        Arc::new(repo)
    }

    async fn service(generator: MockTextGenerator) -> PerspectiveService {
        let ai = AppConfig::testing().ai;
        PerspectiveService::new(
            Arc::new(generator),
            repository().await,
            Arc::new(AppMetrics::new()),
            &ai,
        )
    }

    #[tokio::test]
    async fn test_generate_single_parses_reply() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .withf(|request| {
                request.contents.len() == 1
                    && request.contents[0].text.contains("당신은 물리학자입니다")
                    && request.contents[0].text.contains("수천수 (5번)")
            })
            .times(1)
            .returning(|_| Ok(GenerationOutput::text(PHYSICS_REPLY)));

        let result = service(generator)
            .await
            .generate_single(5, "이직을 고민 중", PerspectiveKind::Physics)
            .await
            .unwrap();

        assert_eq!(result.analysis.title, "물리학 관점");
        assert_eq!(result.analysis.key_message, "작은 힘을 꾸준히");
        assert_eq!(result.analysis.questions.len(), 3);
        assert_eq!(result.hexagram.number, 5);
    }

    #[tokio::test]
    async fn test_generate_single_propagates_generation_error() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Err(AppError::Generation("HTTP 500".into())));

        let err = service(generator)
            .await
            .generate_single(5, "상황", PerspectiveKind::Physics)
            .await
            .unwrap_err();
        assert!(err.is_generation_failure());
    }

    #[tokio::test]
    async fn test_validation_happens_before_generation() {
        let mut generator = MockTextGenerator::new();
        generator.expect_generate().never();
        let service = service(generator).await;

        assert!(matches!(
            service.generate_single(0, "상황", PerspectiveKind::Ancient).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.generate_all(5, "   ").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service.generate_all(6, "상황").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.generate(5, "상황", Some("astrology")).await,
            Err(AppError::UnknownPerspective(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_all_isolates_failures() {
        let mut generator = MockTextGenerator::new();
        generator.expect_generate().times(6).returning(|request| {
            if request.contents[0].text.contains("당신은 생물학자입니다") {
                Err(AppError::Generation("quota".into()))
            } else {
                Ok(GenerationOutput::text(PHYSICS_REPLY))
            }
        });

        let batch = service(generator)
            .await
            .generate_all(5, "상황")
            .await
            .unwrap();

        assert_eq!(batch.perspectives.len(), 6);
        assert_eq!(
            batch
                .perspectives
                .iter()
                .map(|(k, _)| *k)
                .collect::<Vec<_>>(),
            PerspectiveKind::ALL.to_vec()
        );
        assert_eq!(batch.failed, vec![PerspectiveKind::Biology]);

        let biology = batch.get(PerspectiveKind::Biology).unwrap();
        assert_eq!(biology.title, "🌱 생물학 관점");
        assert_eq!(biology.content, "biology 관점 분석 중 오류가 발생했습니다. 다시 시도해주세요.");
        assert_eq!(biology.key_message, "분석을 다시 요청해주세요.");
        assert_eq!(biology.questions, vec!["이 관점에서 다시 분석을 요청하시겠습니까?"]);

        assert_eq!(
            batch.get(PerspectiveKind::Military).unwrap().key_message,
            "작은 힘을 꾸준히"
        );
    }
}
