//! 视角生成与函数调用流水线的集成测试
//!
//! 以脚本化的生成器代替 Gemini，驱动服务层的公开接口。

use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use wisdom_lenses::config::config::AppConfig;
use wisdom_lenses::error::{AppError, Result};
use wisdom_lenses::generation::{GenerationOutput, GenerationRequest, TextGenerator};
use wisdom_lenses::models::catalog::seed_catalog;
use wisdom_lenses::models::function_call::FunctionCall;
use wisdom_lenses::models::hexagram::Hexagram;
use wisdom_lenses::models::hexagram_repository::{HexagramRepository, InMemoryHexagramRepository};
use wisdom_lenses::models::perspective::PerspectiveKind;
use wisdom_lenses::observability::AppMetrics;
use wisdom_lenses::services::functions::{
    ANALYZE_USER_SITUATION, CALCULATE_HEXAGRAM_COMPATIBILITY, FunctionExecutor, FunctionRegistry,
    SELECT_FINAL_HEXAGRAM,
};
use wisdom_lenses::services::orchestrator::FunctionCallingOrchestrator;
use wisdom_lenses::services::perspective::{PerspectiveResponse, PerspectiveService};
use wisdom_lenses::services::{analyze_situation, calculate_compatibility};

/// 按顺序返回预设回复，并记录收到的请求
#[derive(Default)]
struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<GenerationOutput>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    fn new(replies: Vec<Result<GenerationOutput>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutput> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::Generation("script exhausted".into())))
    }
}

async fn seeded_store() -> Arc<dyn HexagramRepository> {
    let repo = InMemoryHexagramRepository::new();
    repo.insert_many(&seed_catalog().unwrap()).await.unwrap();
    Arc::new(repo)
}

fn reply(title: &str) -> Result<GenerationOutput> {
    Ok(GenerationOutput::text(format!(
        "**{title}**\n\n분석 내용입니다.\n\n**핵심 메시지**: 한 걸음씩\n\n**전략적 질문**:\n1. 첫째?\n2. 둘째?\n3. 셋째?"
    )))
}

#[tokio::test]
async fn test_all_perspectives_send_situation_in_every_prompt() {
    let replies = PerspectiveKind::ALL.iter().map(|k| reply(k.label())).collect();
    let generator = ScriptedGenerator::new(replies);
    let metrics = Arc::new(AppMetrics::new());
    let service = PerspectiveService::new(
        generator.clone(),
        seeded_store().await,
        metrics.clone(),
        &AppConfig::testing().ai,
    );

    let situation = "팀장과의 갈등 때문에 이직을 고민하고 있습니다";
    let PerspectiveResponse::All(batch) = service.generate(5, situation, None).await.unwrap() else {
        panic!("expected all perspectives");
    };

    assert!(batch.failed.is_empty());
    let kinds: Vec<PerspectiveKind> = batch.perspectives.iter().map(|(k, _)| *k).collect();
    assert_eq!(kinds, PerspectiveKind::ALL.to_vec());
    for (kind, perspective) in &batch.perspectives {
        assert_eq!(perspective.title, kind.label());
        assert_eq!(perspective.questions.len(), 3);
    }

    let requests = generator.requests();
    assert_eq!(requests.len(), 6);
    for request in &requests {
        let prompt = &request.contents[0].text;
        assert!(prompt.contains(situation));
        assert!(prompt.contains("1.") && prompt.contains("2.") && prompt.contains("3."));
        assert!(request.tools.is_empty());
    }
    assert_eq!(
        metrics
            .generation_calls_total
            .load(std::sync::atomic::Ordering::Relaxed),
        6
    );
}

#[tokio::test]
async fn test_unstructured_reply_degrades_to_defaults() {
    let generator = ScriptedGenerator::new(vec![Ok(GenerationOutput::text("no markers at all"))]);
    let metrics = Arc::new(AppMetrics::new());
    let service = PerspectiveService::new(
        generator,
        seeded_store().await,
        metrics.clone(),
        &AppConfig::testing().ai,
    );

    let result = service
        .generate_single(1, "새로운 시작", PerspectiveKind::Physics)
        .await
        .unwrap();
    assert_eq!(result.analysis.title, PerspectiveKind::Physics.default_title());
    assert_eq!(result.analysis.content, "no markers at all");
    assert!(!result.analysis.key_message.is_empty());
    assert_eq!(result.analysis.questions.len(), 3);
    assert_eq!(
        metrics
            .parser_fallbacks_total
            .load(std::sync::atomic::Ordering::Relaxed),
        1
    );
}

#[tokio::test]
async fn test_out_of_range_number_is_rejected_before_generation() {
    let generator = ScriptedGenerator::new(Vec::new());
    let service = PerspectiveService::new(
        generator.clone(),
        seeded_store().await,
        Arc::new(AppMetrics::new()),
        &AppConfig::testing().ai,
    );

    for number in [0, 65] {
        let err = service.generate(number, "상황", Some("physics")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
    assert!(generator.requests().is_empty());
}

#[test]
fn test_waiting_situation_prefers_waiting_hexagram() {
    let catalog = vec![
        Hexagram::new(5, "☵/☰", "Waiting", "strategic waiting", "wait for the moment")
            .with_keywords(["strategy", "waiting", "patience"]),
        Hexagram::new(51, "☳/☳", "Thunder", "shock", "sudden movement")
            .with_keywords(["shock", "movement"]),
    ];
    let scores = calculate_compatibility(
        &catalog,
        &["anxiety".to_string()],
        "I need to wait patiently at work",
        &["waiting".to_string(), "patience".to_string()],
    );

    assert_eq!(scores.len(), catalog.len());
    assert_eq!(scores[0].number, 5);
    assert!(scores[0].score > scores[1].score);
    assert!(scores.iter().all(|s| s.score >= 0.1));
}

#[tokio::test]
async fn test_local_selection_chain_through_registry() {
    let registry = FunctionRegistry::new(seeded_store().await);

    let analysis = registry
        .execute(&FunctionCall::new(
            ANALYZE_USER_SITUATION,
            json!({"userInput": "회사 일이 불안하고 인내가 필요합니다"}),
        ))
        .await;
    assert!(analysis.result.success);
    let analysis_data = analysis.result.data.unwrap();
    let parsed = analyze_situation("회사 일이 불안하고 인내가 필요합니다").unwrap();
    assert_eq!(analysis_data["emotions"], json!(parsed.emotions));

    let compatibility = registry
        .execute(&FunctionCall::new(
            CALCULATE_HEXAGRAM_COMPATIBILITY,
            json!({
                "emotions": analysis_data["emotions"],
                "situation": analysis_data["situation"],
                "keywords": analysis_data["keywords"],
            }),
        ))
        .await;
    assert!(compatibility.result.success);
    let report = compatibility.result.data.unwrap();
    assert_eq!(report["total_hexagrams"], 64);
    assert_eq!(report["source"], "store");

    let selection = registry
        .execute(&FunctionCall::new(
            SELECT_FINAL_HEXAGRAM,
            json!({
                "compatibilityScores": report["top_scores"],
                "userAnalysis": analysis_data,
            }),
        ))
        .await;
    assert!(selection.result.success);
    let selected = selection.result.data.unwrap();
    assert_eq!(
        selected["selected_hexagram"]["number"],
        report["top_scores"][0]["number"]
    );
    assert!(selected["alternative_hexagrams"].as_array().unwrap().len() <= 3);
}

#[tokio::test]
async fn test_orchestrator_runs_both_rounds_against_store() {
    let generator = ScriptedGenerator::new(vec![
        Ok(GenerationOutput::calls(vec![FunctionCall::new(
            "get_hexagram_info",
            json!({"number": 64}),
        )])),
        Ok(GenerationOutput::text("64번 괘는 화수미제입니다.")),
    ]);
    let store = seeded_store().await;
    let orchestrator = FunctionCallingOrchestrator::new(
        generator.clone(),
        Arc::new(FunctionRegistry::new(store)),
        Arc::new(AppMetrics::new()),
        &AppConfig::testing().ai,
    );

    let outcome = orchestrator.run("64번 괘를 설명해줘").await.unwrap();
    assert_eq!(outcome.rounds, 2);
    assert_eq!(outcome.final_response, "64번 괘는 화수미제입니다.");

    let requests = generator.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].tools.len(), 5);
    assert!(requests[1].tools.is_empty());
    assert!(requests[1].contents[0].text.contains("화수미제"));
}
