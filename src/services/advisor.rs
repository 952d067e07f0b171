//! 卦象推荐服务
//!
//! 两种模式：
//! - 选择模式：列出卦目录，请模型给出 `SELECTED_HEXAGRAM: n`，并解析理由与置信度
//! - 骰子模式：卦号由调用方给出（或由两枚八面骰换算），只请求一段建议

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use rand::Rng;
use rand::distributions::Alphanumeric;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::config::AiConfig;
use crate::error::{AppError, Result};
use crate::generation::{GenerationConfig, GenerationRequest, TextGenerator};
use crate::models::hexagram::{Hexagram, MAX_HEXAGRAM_NUMBER, validate_hexagram_number};
use crate::models::hexagram_repository::HexagramRepository;
use crate::observability::AppMetrics;

/// 处境描述的最少字符数
pub const MIN_SITUATION_CHARS: usize = 10;
/// 推荐请求的采样温度
pub const ADVISOR_TEMPERATURE: f32 = 0.7;
/// 推荐请求的最大输出长度
pub const ADVISOR_MAX_OUTPUT_TOKENS: u32 = 500;
/// 未给出置信度时的默认值
pub const DEFAULT_CONFIDENCE: f64 = 0.7;

/// 骰子面数
const DICE_FACES: u8 = 8;
/// 理由缺失时截取的字符数
const REASONING_FALLBACK_CHARS: usize = 300;

static SELECTED_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)SELECTED_HEXAGRAM:\s*([0-9]+)").expect("valid regex"));
static REASONING_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)REASONING:\s*").expect("valid regex"));
static REASONING_END_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)INSIGHT:|CONFIDENCE:").expect("valid regex"));
static CONFIDENCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)CONFIDENCE:\s*([0-9]+)").expect("valid regex"));

/// 推荐请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdviceRequest {
    /// 用户处境描述
    pub situation: String,
    /// 骰子模式下指定的卦号
    #[serde(default)]
    pub hexagram_number: Option<i64>,
    /// 两枚八面骰的点数
    #[serde(default)]
    pub dice: Option<(u8, u8)>,
}

impl AdviceRequest {
    pub fn new(situation: impl Into<String>) -> Self {
        Self {
            situation: situation.into(),
            ..Default::default()
        }
    }

    pub fn with_hexagram(mut self, number: i64) -> Self {
        self.hexagram_number = Some(number);
        self
    }

    pub fn with_dice(mut self, first: u8, second: u8) -> Self {
        self.dice = Some((first, second));
        self
    }
}

/// 推荐模式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AdviceMode {
    Selection,
    Dice,
}

/// 被选中的卦
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectedHexagram {
    pub number: u8,
    pub name: String,
    pub symbol: String,
    pub core_viewpoint: String,
    pub summary: String,
    pub keywords: Vec<String>,
}

impl From<&Hexagram> for SelectedHexagram {
    fn from(hexagram: &Hexagram) -> Self {
        Self {
            number: hexagram.number,
            name: hexagram.name.clone(),
            symbol: hexagram.symbol.clone(),
            core_viewpoint: hexagram.core_viewpoint.clone(),
            summary: hexagram.summary.clone(),
            keywords: hexagram.keywords.clone(),
        }
    }
}

/// 模型给出的分析
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdviceAnalysis {
    pub reasoning: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub ai_response: String,
}

/// 推荐结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdviceResult {
    pub mode: AdviceMode,
    pub selected_hexagram: SelectedHexagram,
    pub analysis: AdviceAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub user_situation: String,
    pub timestamp: DateTime<Utc>,
}

/// 两枚八面骰换算为卦号
pub fn hexagram_from_dice(first: u8, second: u8) -> Result<u8> {
    let valid = 1..=DICE_FACES;
    if !valid.contains(&first) || !valid.contains(&second) {
        return Err(AppError::Validation(format!(
            "주사위 값은 1-{} 범위여야 합니다: ({}, {})",
            DICE_FACES, first, second
        )));
    }
    Ok((first - 1) * DICE_FACES + second)
}

/// 解析模型选择的卦号：优先 `SELECTED_HEXAGRAM:`，其次第一个独立出现的 1-64 整数
pub fn parse_selected_hexagram(response: &str) -> Option<u8> {
    let in_range = |n: u64| (1..=u64::from(MAX_HEXAGRAM_NUMBER)).contains(&n);

    if let Some(caps) = SELECTED_PATTERN.captures(response) {
        if let Ok(n) = caps[1].parse::<u64>() {
            if in_range(n) {
                return Some(n as u8);
            }
        }
    }

    standalone_numbers(response)
        .into_iter()
        .find(|n| in_range(*n))
        .map(|n| n as u8)
}

/// 前后都不是 ASCII 单词字符的数字串
fn standalone_numbers(text: &str) -> Vec<u64> {
    let is_word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    let bytes = text.as_bytes();
    let mut numbers = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        let bounded_left = start == 0 || !is_word(bytes[start - 1]);
        let bounded_right = i == bytes.len() || !is_word(bytes[i]);
        if bounded_left && bounded_right {
            if let Ok(n) = text[start..i].parse::<u64>() {
                numbers.push(n);
            }
        }
    }
    numbers
}

/// 提取 `REASONING:` 之后到 `INSIGHT:` / `CONFIDENCE:` 或结尾的文本
pub fn extract_reasoning(response: &str) -> String {
    if let Some(start) = REASONING_PATTERN.find(response) {
        let rest = &response[start.end()..];
        let end = REASONING_END_PATTERN
            .find(rest)
            .map(|m| m.start())
            .unwrap_or(rest.len());
        return rest[..end].trim().to_string();
    }

    let head: String = response.chars().take(REASONING_FALLBACK_CHARS).collect();
    format!("{}...", head)
}

/// 提取 `CONFIDENCE: n`，限制在 1-10 后归一化
pub fn extract_confidence(response: &str) -> f64 {
    CONFIDENCE_PATTERN
        .captures(response)
        .map(|caps| caps[1].parse::<u64>().unwrap_or(10).clamp(1, 10) as f64 / 10.0)
        .unwrap_or(DEFAULT_CONFIDENCE)
}

/// 会话 ID：`session_<毫秒>_<9 位随机字符>`
pub fn generate_session_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(char::from)
        .collect::<String>()
        .to_lowercase();
    format!("session_{}_{}", Utc::now().timestamp_millis(), suffix)
}

fn selection_prompt(situation: &str, catalog: &[Hexagram]) -> String {
    let list: Vec<String> = catalog
        .iter()
        .map(|h| format!("{}. {} - {}", h.number, h.name, h.core_viewpoint))
        .collect();

    format!(
        "상황: {}\n\n괘 목록:\n{}\n\n가장 적합한 괘 번호를 선택하고 이유를 설명하세요.\n다음 형식을 지켜주세요:\nSELECTED_HEXAGRAM: [번호]\nREASONING: [선택 이유]\nCONFIDENCE: [1-10]",
        situation,
        list.join("\n")
    )
}

fn dice_prompt(situation: &str, hexagram: &Hexagram) -> String {
    format!(
        "{}번 괘 {}에 대해 사용자 상황에 맞는 조언을 제공해주세요. 사용자 상황: {}. 200자 이내로 작성해주세요.",
        hexagram.number, hexagram.name, situation
    )
}

/// 卦象推荐服务 trait
#[async_trait]
pub trait HexagramAdvisor: Send + Sync {
    /// 根据处境推荐一卦，或为指定的卦给出建议
    async fn analyze(&self, request: &AdviceRequest) -> Result<AdviceResult>;
}

/// 卦象推荐服务实现
pub struct HexagramAdvisorImpl {
    generator: Arc<dyn TextGenerator>,
    hexagrams: Arc<dyn HexagramRepository>,
    metrics: Arc<AppMetrics>,
    model: String,
    config: GenerationConfig,
}

impl HexagramAdvisorImpl {
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
            config: GenerationConfig::from_ai_config(ai)
                .with_temperature(ADVISOR_TEMPERATURE)
                .with_max_output_tokens(ADVISOR_MAX_OUTPUT_TOKENS),
        }
    }

    async fn ask(&self, prompt: String) -> Result<String> {
        let request = GenerationRequest::prompt(&self.model, prompt).with_config(self.config.clone());
        self.metrics.record_generation_call();
        self.generator
            .generate(&request)
            .await
            .and_then(|output| output.into_text())
            .inspect_err(|e| {
                self.metrics.record_generation_failure();
                tracing::error!(error = %e, "Advisor generation failed")
            })
    }

    /// 骰子模式下的卦号
    fn fixed_number(request: &AdviceRequest) -> Result<Option<u8>> {
        if let Some(number) = request.hexagram_number {
            return validate_hexagram_number(number).map(Some);
        }
        request
            .dice
            .map(|(first, second)| hexagram_from_dice(first, second))
            .transpose()
    }
}

#[async_trait]
impl HexagramAdvisor for HexagramAdvisorImpl {
    async fn analyze(&self, request: &AdviceRequest) -> Result<AdviceResult> {
        let situation = request.situation.trim();
        if situation.chars().count() < MIN_SITUATION_CHARS {
            return Err(AppError::Validation(format!(
                "상황 설명을 최소 {}자 이상 입력해주세요.",
                MIN_SITUATION_CHARS
            )));
        }
        let fixed = Self::fixed_number(request)?;

        let catalog = self.hexagrams.find_all().await?;
        if catalog.is_empty() {
            return Err(AppError::NotFound(
                "괘 데이터를 찾을 수 없습니다. 먼저 시드 데이터를 입력해주세요.".to_string(),
            ));
        }

        if let Some(number) = fixed {
            let hexagram = catalog
                .iter()
                .find(|h| h.number == number)
                .ok_or_else(|| {
                    AppError::NotFound(format!("선택된 괘({}번)를 찾을 수 없습니다.", number))
                })?;
            let text = self.ask(dice_prompt(situation, hexagram)).await?;

            tracing::info!(number, "Dice advice generated");
            return Ok(AdviceResult {
                mode: AdviceMode::Dice,
                selected_hexagram: SelectedHexagram::from(hexagram),
                analysis: AdviceAnalysis {
                    reasoning: text.clone(),
                    confidence: None,
                    ai_response: text,
                },
                session_id: None,
                user_situation: situation.to_string(),
                timestamp: Utc::now(),
            });
        }

        let text = self.ask(selection_prompt(situation, &catalog)).await?;
        let number = parse_selected_hexagram(&text).ok_or_else(|| {
            AppError::Generation("AI가 적절한 괘를 선택하지 못했습니다. 다시 시도해주세요.".to_string())
        })?;
        let hexagram = catalog.iter().find(|h| h.number == number).ok_or_else(|| {
            AppError::NotFound(format!("선택된 괘({}번)를 찾을 수 없습니다.", number))
        })?;

        tracing::info!(number, name = %hexagram.name, "Hexagram selected");
        Ok(AdviceResult {
            mode: AdviceMode::Selection,
            selected_hexagram: SelectedHexagram::from(hexagram),
            analysis: AdviceAnalysis {
                reasoning: extract_reasoning(&text),
                confidence: Some(extract_confidence(&text)),
                ai_response: text,
            },
            session_id: Some(generate_session_id()),
            user_situation: situation.to_string(),
            timestamp: Utc::now(),
        })
    }
}

/// 创建卦象推荐服务
pub fn create_hexagram_advisor(
    generator: Arc<dyn TextGenerator>,
    hexagrams: Arc<dyn HexagramRepository>,
    metrics: Arc<AppMetrics>,
    ai: &AiConfig,
) -> Arc<dyn HexagramAdvisor> {
    Arc::new(HexagramAdvisorImpl::new(generator, hexagrams, metrics, ai))
}
