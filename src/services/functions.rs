//! 可供生成服务调用的本地函数
//!
//! 函数声明与分发。每个处理函数都不会向上抛错，失败以
//! `FunctionOutcome { success: false, .. }` 的形式交还给编排器。

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::error::AppError;
use crate::generation::FunctionDeclaration;
use crate::models::catalog::seed_catalog;
use crate::models::function_call::{
    FunctionCall, FunctionCallResult, FunctionErrorKind, FunctionOutcome,
};
use crate::models::hexagram::{Hexagram, validate_hexagram_number};
use crate::models::hexagram_repository::HexagramRepository;
use crate::services::compatibility::{CompatibilityScore, compatibility_report};
use crate::services::situation::{SituationAnalysis, analyze_situation};

pub const GET_HEXAGRAM_INFO: &str = "get_hexagram_info";
pub const SEARCH_HEXAGRAM_BY_KEYWORD: &str = "search_hexagram_by_keyword";
pub const ANALYZE_USER_SITUATION: &str = "analyze_user_situation";
pub const CALCULATE_HEXAGRAM_COMPATIBILITY: &str = "calculate_hexagram_compatibility";
pub const SELECT_FINAL_HEXAGRAM: &str = "select_final_hexagram";

/// 默认检索条数
const DEFAULT_SEARCH_LIMIT: usize = 3;
/// 备选卦数量
const ALTERNATIVES: usize = 3;

/// 函数声明列表
pub fn function_declarations() -> Vec<FunctionDeclaration> {
    vec![
        FunctionDeclaration {
            name: GET_HEXAGRAM_INFO.to_string(),
            description: "특정 괘 번호(1-64)의 상세 정보를 조회합니다".to_string(),
            parameters: json!({
                "type": "OBJECT",
                "properties": {
                    "number": {"type": "INTEGER", "description": "괘 번호 (1-64)"}
                },
                "required": ["number"]
            }),
        },
        FunctionDeclaration {
            name: SEARCH_HEXAGRAM_BY_KEYWORD.to_string(),
            description: "키워드로 관련된 괘를 검색합니다".to_string(),
            parameters: json!({
                "type": "OBJECT",
                "properties": {
                    "keyword": {"type": "STRING", "description": "검색할 키워드"},
                    "limit": {"type": "INTEGER", "description": "결과 개수 제한 (기본 3)"}
                },
                "required": ["keyword"]
            }),
        },
        FunctionDeclaration {
            name: ANALYZE_USER_SITUATION.to_string(),
            description: "사용자의 상황 텍스트에서 감정, 상황 분류, 키워드를 추출합니다".to_string(),
            parameters: json!({
                "type": "OBJECT",
                "properties": {
                    "userInput": {"type": "STRING", "description": "사용자가 입력한 상황 설명"}
                },
                "required": ["userInput"]
            }),
        },
        FunctionDeclaration {
            name: CALCULATE_HEXAGRAM_COMPATIBILITY.to_string(),
            description: "분석된 감정, 상황, 키워드로 64괘 각각의 적합도를 계산합니다".to_string(),
            parameters: json!({
                "type": "OBJECT",
                "properties": {
                    "emotions": {"type": "ARRAY", "items": {"type": "STRING"}, "description": "감정 목록"},
                    "situation": {"type": "STRING", "description": "상황 분류"},
                    "keywords": {"type": "ARRAY", "items": {"type": "STRING"}, "description": "키워드 목록"}
                },
                "required": ["emotions", "situation", "keywords"]
            }),
        },
        FunctionDeclaration {
            name: SELECT_FINAL_HEXAGRAM.to_string(),
            description: "적합도 점수를 바탕으로 최종 괘를 선택하고 근거를 제시합니다".to_string(),
            parameters: json!({
                "type": "OBJECT",
                "properties": {
                    "compatibilityScores": {
                        "type": "ARRAY",
                        "description": "점수 내림차순의 적합도 목록",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "number": {"type": "INTEGER"},
                                "name": {"type": "STRING"},
                                "score": {"type": "NUMBER"},
                                "reason": {"type": "STRING"}
                            }
                        }
                    },
                    "userAnalysis": {
                        "type": "OBJECT",
                        "description": "analyze_user_situation 결과",
                        "properties": {
                            "emotions": {"type": "ARRAY", "items": {"type": "STRING"}},
                            "situation": {"type": "STRING"},
                            "keywords": {"type": "ARRAY", "items": {"type": "STRING"}}
                        }
                    }
                },
                "required": ["compatibilityScores", "userAnalysis"]
            }),
        },
    ]
}

/// 函数执行器
#[async_trait]
pub trait FunctionExecutor: Send + Sync {
    /// 声明的函数列表
    fn declarations(&self) -> Vec<FunctionDeclaration>;

    /// 执行一次调用，失败也以结果形式返回
    async fn execute(&self, call: &FunctionCall) -> FunctionCallResult;
}

type HandlerResult = std::result::Result<Value, (FunctionErrorKind, String)>;

fn invalid(message: impl Into<String>) -> (FunctionErrorKind, String) {
    (FunctionErrorKind::InvalidArguments, message.into())
}

fn internal(e: AppError) -> (FunctionErrorKind, String) {
    (FunctionErrorKind::Internal, e.to_string())
}

fn parse_args<T: for<'de> Deserialize<'de>>(args: &Value) -> std::result::Result<T, (FunctionErrorKind, String)> {
    let args = if args.is_null() { json!({}) } else { args.clone() };
    serde_json::from_value(args).map_err(|e| invalid(format!("잘못된 인자: {}", e)))
}

/// 数字参数可能以浮点数形式到达
fn integer_arg(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
}

#[derive(Deserialize)]
struct HexagramInfoArgs {
    #[serde(default)]
    number: Value,
}

#[derive(Deserialize)]
struct SearchArgs {
    #[serde(default)]
    keyword: String,
    #[serde(default)]
    limit: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeArgs {
    #[serde(default)]
    user_input: String,
}

#[derive(Deserialize)]
struct CompatibilityArgs {
    #[serde(default)]
    emotions: Vec<String>,
    #[serde(default)]
    situation: String,
    #[serde(default)]
    keywords: Vec<String>,
}

/// 选择阶段接受的评分条目，只要求序号与分数
#[derive(Debug, Clone, Deserialize)]
struct ScoreEntry {
    number: Value,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectArgs {
    #[serde(default)]
    compatibility_scores: Vec<ScoreEntry>,
    #[serde(default)]
    user_analysis: SituationAnalysis,
}

fn hexagram_info(hexagram: &Hexagram) -> Value {
    json!({
        "number": hexagram.number,
        "name": hexagram.name,
        "symbol": hexagram.symbol,
        "meaning": hexagram.summary,
        "keywords": hexagram.keywords,
        "mental_models": hexagram.mental_models,
        "description": hexagram.core_viewpoint,
    })
}

/// 基于卦库的函数执行器
pub struct FunctionRegistry {
    hexagrams: Arc<dyn HexagramRepository>,
}

impl FunctionRegistry {
    pub fn new(hexagrams: Arc<dyn HexagramRepository>) -> Self {
        Self { hexagrams }
    }

    async fn get_hexagram_info(&self, args: &Value) -> HandlerResult {
        let args: HexagramInfoArgs = parse_args(args)?;
        let number = integer_arg(&args.number)
            .ok_or_else(|| invalid("잘못된 괘 번호입니다. 1-64 범위의 숫자를 입력해주세요."))?;
        let number = validate_hexagram_number(number)
            .map_err(|_| invalid("잘못된 괘 번호입니다. 1-64 범위의 숫자를 입력해주세요."))?;

        match self.hexagrams.find_by_number(number).await.map_err(internal)? {
            Some(hexagram) => Ok(hexagram_info(&hexagram)),
            None => Err((
                FunctionErrorKind::NotFound,
                format!("{}번 괘를 찾을 수 없습니다.", number),
            )),
        }
    }

    async fn search_hexagram_by_keyword(&self, args: &Value) -> HandlerResult {
        let args: SearchArgs = parse_args(args)?;
        let keyword = args.keyword.trim();
        if keyword.is_empty() {
            return Err(invalid("검색 키워드를 입력해주세요."));
        }
        let limit = args
            .limit
            .as_ref()
            .and_then(integer_arg)
            .filter(|n| *n > 0)
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_SEARCH_LIMIT);

        let found = self
            .hexagrams
            .search_by_keyword(keyword)
            .await
            .map_err(internal)?;
        let needle = keyword.to_lowercase();
        let results: Vec<Value> = found
            .iter()
            .take(limit)
            .map(|hexagram| {
                let relevant: Vec<&String> = hexagram
                    .keywords
                    .iter()
                    .filter(|k| {
                        let k = k.to_lowercase();
                        k.contains(&needle) || needle.contains(&k)
                    })
                    .collect();
                let mut info = hexagram_info(hexagram);
                info["relevant_keywords"] = json!(relevant);
                info
            })
            .collect();

        let mut data = json!({
            "keyword": keyword,
            "count": results.len(),
            "results": results,
        });
        if found.is_empty() {
            data["message"] = json!(format!("'{}' 키워드와 관련된 괘를 찾을 수 없습니다.", keyword));
        }
        Ok(data)
    }

    fn analyze_user_situation(&self, args: &Value) -> HandlerResult {
        let args: AnalyzeArgs = parse_args(args)?;
        let analysis =
            analyze_situation(&args.user_input).map_err(|_| invalid("분석할 텍스트를 입력해주세요."))?;
        serde_json::to_value(analysis).map_err(|e| internal(e.into()))
    }

    async fn calculate_hexagram_compatibility(&self, args: &Value) -> HandlerResult {
        let args: CompatibilityArgs = parse_args(args)?;

        let mut catalog = self.hexagrams.find_all().await.map_err(internal)?;
        let mut source = "store";
        if catalog.is_empty() {
            tracing::warn!("Hexagram store is empty, scoring against the built-in catalog");
            catalog = seed_catalog().map_err(internal)?;
            source = "seed";
        }

        let report = compatibility_report(&catalog, &args.emotions, &args.situation, &args.keywords);
        let mut data = serde_json::to_value(report).map_err(|e| internal(e.into()))?;
        data["source"] = json!(source);
        Ok(data)
    }

    async fn select_final_hexagram(&self, args: &Value) -> HandlerResult {
        let args: SelectArgs = parse_args(args)?;
        let Some(top) = args.compatibility_scores.first() else {
            return Err(invalid("적합도 점수 데이터가 필요합니다."));
        };
        let number = integer_arg(&top.number)
            .ok_or_else(|| invalid("적합도 점수의 괘 번호가 올바르지 않습니다."))?;
        let number = validate_hexagram_number(number)
            .map_err(|_| invalid("적합도 점수의 괘 번호가 올바르지 않습니다."))?;

        let stored = self.hexagrams.find_by_number(number).await.map_err(internal)?;
        let (name, symbol, core_viewpoint) = match &stored {
            Some(h) => (h.name.clone(), h.symbol.clone(), h.core_viewpoint.clone()),
            None => (
                top.name.clone().unwrap_or_else(|| format!("{}번 괘", number)),
                String::new(),
                top.summary.clone().unwrap_or_default(),
            ),
        };

        let analysis = &args.user_analysis;
        let join_or = |items: &[String], fallback: &str| {
            if items.is_empty() {
                fallback.to_string()
            } else {
                items.join(", ")
            }
        };
        let situation = if analysis.situation.is_empty() {
            "일반적 상황"
        } else {
            analysis.situation.as_str()
        };
        let reasoning = format!(
            "사용자 상황 분석:\n- 감정: {}\n- 상황: {}\n- 키워드: {}\n\n선택된 괘: {}\n점수: {}\n선택 이유: {}\n\n이 괘는 현재 상황에서 가장 적합한 관점을 제시합니다.",
            join_or(&analysis.emotions, "중립"),
            situation,
            join_or(&analysis.keywords, "없음"),
            name,
            top.score,
            top.reason.as_deref().unwrap_or("기본 점수"),
        );

        let alternatives: Vec<Value> = args
            .compatibility_scores
            .iter()
            .skip(1)
            .take(ALTERNATIVES)
            .map(|entry| {
                json!({
                    "number": entry.number,
                    "name": entry.name,
                    "score": entry.score,
                    "reason": entry.reason,
                    "keywords": entry.keywords,
                })
            })
            .collect();

        Ok(json!({
            "selected_hexagram": {
                "number": number,
                "name": name,
                "symbol": symbol,
                "core_viewpoint": core_viewpoint,
                "score": top.score,
            },
            "reasoning": reasoning,
            "user_analysis": analysis,
            "alternative_hexagrams": alternatives,
        }))
    }
}

#[async_trait]
impl FunctionExecutor for FunctionRegistry {
    fn declarations(&self) -> Vec<FunctionDeclaration> {
        function_declarations()
    }

    async fn execute(&self, call: &FunctionCall) -> FunctionCallResult {
        tracing::info!(function = %call.name, "Executing function call");

        let result = match call.name.as_str() {
            GET_HEXAGRAM_INFO => self.get_hexagram_info(&call.args).await,
            SEARCH_HEXAGRAM_BY_KEYWORD => self.search_hexagram_by_keyword(&call.args).await,
            ANALYZE_USER_SITUATION => self.analyze_user_situation(&call.args),
            CALCULATE_HEXAGRAM_COMPATIBILITY => {
                self.calculate_hexagram_compatibility(&call.args).await
            }
            SELECT_FINAL_HEXAGRAM => self.select_final_hexagram(&call.args).await,
            unknown => {
                tracing::warn!(function = %unknown, "Unknown function requested");
                Err((
                    FunctionErrorKind::UnknownFunction,
                    format!("알 수 없는 함수: {}", unknown),
                ))
            }
        };

        let outcome = match result {
            Ok(data) => FunctionOutcome::ok(data),
            Err((kind, message)) => {
                tracing::debug!(function = %call.name, error = %message, "Function call failed");
                FunctionOutcome::failure(kind, message)
            }
        };
        FunctionCallResult::new(call, outcome)
    }
}

/// 将评分结果转换为选择函数的参数
pub fn selection_args(scores: &[CompatibilityScore], analysis: &SituationAnalysis) -> Value {
    json!({
        "compatibilityScores": scores,
        "userAnalysis": analysis,
    })
}
