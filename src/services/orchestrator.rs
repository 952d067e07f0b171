//! 两轮函数调用编排
//!
//! 第一轮携带函数声明发送提示；若模型请求了函数调用，则在本地依次执行，
//! 再把执行结果作为上下文发起第二轮（不带函数声明），得到最终回答。

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::config::AiConfig;
use crate::error::{AppError, Result};
use crate::generation::{GenerationConfig, GenerationOutput, GenerationRequest, TextGenerator};
use crate::models::function_call::{FunctionCall, FunctionCallResult};
use crate::observability::AppMetrics;
use crate::services::functions::FunctionExecutor;

/// 模型既没有文本也没有函数调用时的回答
pub const NO_RESPONSE_TEXT: &str = "응답을 생성할 수 없습니다.";

/// 编排结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrchestrationOutcome {
    pub prompt: String,
    pub final_response: String,
    pub function_calls: Vec<FunctionCall>,
    pub function_results: Vec<FunctionCallResult>,
    pub rounds: u8,
}

/// 第一轮的结果
#[derive(Debug, Clone, PartialEq)]
pub enum FirstRound {
    /// 模型直接给出回答
    Direct(String),
    /// 模型请求执行函数
    FunctionCalls(Vec<FunctionCall>),
}

#[derive(Debug)]
enum State {
    AwaitingFirstResponse,
    AwaitingFinalResponse {
        calls: Vec<FunctionCall>,
        results: Vec<FunctionCallResult>,
    },
    Done(OrchestrationOutcome),
}

/// 把函数执行结果渲染为第二轮提示
pub fn render_final_prompt(prompt: &str, results: &[FunctionCallResult]) -> String {
    let blocks: Vec<String> = results
        .iter()
        .map(|r| {
            let rendered = serde_json::to_string_pretty(&r.result)
                .unwrap_or_else(|_| r.result.error.clone().unwrap_or_default());
            format!("함수 {} 실행 결과:\n{}", r.name, rendered)
        })
        .collect();

    format!(
        "사용자 요청: {}\n\n다음 함수들이 실행되었습니다:\n{}\n\n위 정보를 바탕으로 사용자의 요청에 대해 자연스럽고 도움이 되는 응답을 생성해주세요.",
        prompt,
        blocks.join("\n\n")
    )
}

/// 函数调用编排器
pub struct FunctionCallingOrchestrator {
    generator: Arc<dyn TextGenerator>,
    executor: Arc<dyn FunctionExecutor>,
    metrics: Arc<AppMetrics>,
    model: String,
    config: GenerationConfig,
    system_instruction: Option<String>,
}

impl FunctionCallingOrchestrator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        executor: Arc<dyn FunctionExecutor>,
        metrics: Arc<AppMetrics>,
        ai: &AiConfig,
    ) -> Self {
        Self {
            generator,
            executor,
            metrics,
            model: ai.model.clone(),
            config: GenerationConfig::from_ai_config(ai),
            system_instruction: ai.system_instruction.clone(),
        }
    }

    fn ensure_prompt(prompt: &str) -> Result<()> {
        if prompt.trim().is_empty() {
            return Err(AppError::Validation("프롬프트를 입력해주세요.".to_string()));
        }
        Ok(())
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutput> {
        self.metrics.record_generation_call();
        self.generator.generate(request).await.inspect_err(|e| {
            self.metrics.record_generation_failure();
            tracing::error!(error = %e, "Generation failed during function calling");
        })
    }

    /// 第一轮：携带函数声明
    pub async fn first_round(&self, prompt: &str) -> Result<FirstRound> {
        Self::ensure_prompt(prompt)?;
        let request = GenerationRequest::prompt(&self.model, prompt)
            .with_config(self.config.clone())
            .with_tools(self.executor.declarations())
            .with_system_instruction(self.system_instruction.clone());

        let output = self.generate(&request).await?;
        if output.function_calls.is_empty() {
            let text = output
                .text
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| NO_RESPONSE_TEXT.to_string());
            return Ok(FirstRound::Direct(text));
        }

        tracing::debug!(
            calls = output.function_calls.len(),
            "Model requested function calls"
        );
        Ok(FirstRound::FunctionCalls(output.function_calls))
    }

    /// 按返回顺序依次执行函数调用
    pub async fn execute_calls(&self, calls: &[FunctionCall]) -> Vec<FunctionCallResult> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            self.metrics.record_function_call();
            results.push(self.executor.execute(call).await);
        }
        results
    }

    /// 第二轮：以函数执行结果为上下文，不带函数声明
    pub async fn final_round(&self, prompt: &str, results: &[FunctionCallResult]) -> Result<String> {
        Self::ensure_prompt(prompt)?;
        let request = GenerationRequest::prompt(&self.model, render_final_prompt(prompt, results))
            .with_config(self.config.clone())
            .with_system_instruction(self.system_instruction.clone());

        self.generate(&request).await?.into_text()
    }

    /// 以客户端提交的执行结果进行第二轮
    ///
    /// 未声明的函数只可能带着失败结果回来，声称成功的未声明函数直接拒绝。
    pub async fn resume_final_round(&self, prompt: &str, results: &[FunctionCallResult]) -> Result<String> {
        Self::ensure_prompt(prompt)?;
        let declared = self.executor.declarations();
        if let Some(forged) = results
            .iter()
            .find(|r| r.result.success && !declared.iter().any(|d| d.name == r.name))
        {
            return Err(AppError::UnknownFunction(format!(
                "알 수 없는 함수: {}",
                forged.name
            )));
        }
        self.final_round(prompt, results).await
    }

    /// 完整执行两轮协议
    pub async fn run(&self, prompt: &str) -> Result<OrchestrationOutcome> {
        Self::ensure_prompt(prompt)?;
        let mut state = State::AwaitingFirstResponse;

        loop {
            state = match state {
                State::AwaitingFirstResponse => match self.first_round(prompt).await? {
                    FirstRound::Direct(text) => State::Done(OrchestrationOutcome {
                        prompt: prompt.to_string(),
                        final_response: text,
                        function_calls: Vec::new(),
                        function_results: Vec::new(),
                        rounds: 1,
                    }),
                    FirstRound::FunctionCalls(calls) => {
                        let results = self.execute_calls(&calls).await;
                        State::AwaitingFinalResponse { calls, results }
                    }
                },
                State::AwaitingFinalResponse { calls, results } => {
                    let final_response = self.final_round(prompt, &results).await?;
                    State::Done(OrchestrationOutcome {
                        prompt: prompt.to_string(),
                        final_response,
                        function_calls: calls,
                        function_results: results,
                        rounds: 2,
                    })
                }
                State::Done(outcome) => {
                    tracing::info!(
                        rounds = outcome.rounds,
                        calls = outcome.function_calls.len(),
                        "Function calling completed"
                    );
                    return Ok(outcome);
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config::AppConfig;
    use crate::generation::MockTextGenerator;
    use crate::models::catalog::seed_catalog;
    use crate::models::function_call::FunctionOutcome;
    use crate::models::hexagram_repository::{HexagramRepository, InMemoryHexagramRepository};
    use crate::services::functions::{FunctionRegistry, GET_HEXAGRAM_INFO};
    use mockall::Sequence;
    use serde_json::json;

    async fn executor() -> Arc<dyn FunctionExecutor> {
        let repo = InMemoryHexagramRepository::new();
        repo.insert_many(&seed_catalog().unwrap()).await.unwrap();
        Arc::new(FunctionRegistry::new(Arc::new(repo)))
    }

    async fn orchestrator(generator: MockTextGenerator) -> FunctionCallingOrchestrator {
        FunctionCallingOrchestrator::new(
            Arc::new(generator),
            executor().await,
            Arc::new(AppMetrics::new()),
            &AppConfig::testing().ai,
        )
    }

    #[tokio::test]
    async fn test_direct_answer_skips_second_round() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .withf(|request| request.tools.len() == 5)
            .times(1)
            .returning(|_| Ok(GenerationOutput::text("바로 답합니다")));

        let outcome = orchestrator(generator).await.run("안녕").await.unwrap();
        assert_eq!(outcome.final_response, "바로 답합니다");
        assert_eq!(outcome.rounds, 1);
        assert!(outcome.function_calls.is_empty());
        assert!(outcome.function_results.is_empty());
    }

    #[tokio::test]
    async fn test_function_call_result_feeds_second_round() {
        let mut generator = MockTextGenerator::new();
        let mut seq = Sequence::new();
        generator
            .expect_generate()
            .withf(|request| !request.tools.is_empty())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(GenerationOutput::calls(vec![FunctionCall::new(
                    GET_HEXAGRAM_INFO,
                    json!({"number": 1}),
                )]))
            });
        generator
            .expect_generate()
            .withf(|request| {
                let text = &request.contents[0].text;
                request.tools.is_empty()
                    && text.starts_with("사용자 요청: 1번 괘를 알려줘")
                    && text.contains("함수 get_hexagram_info 실행 결과:")
                    && text.contains("중천건")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(GenerationOutput::text("중천건은 창조의 괘입니다.")));

        let outcome = orchestrator(generator)
            .await
            .run("1번 괘를 알려줘")
            .await
            .unwrap();

        assert_eq!(outcome.rounds, 2);
        assert_eq!(outcome.function_calls.len(), 1);
        assert!(outcome.function_results[0].result.success);
        assert_eq!(outcome.final_response, "중천건은 창조의 괘입니다.");
    }

    #[tokio::test]
    async fn test_unknown_function_does_not_abort() {
        let mut generator = MockTextGenerator::new();
        let mut seq = Sequence::new();
        generator
            .expect_generate()
            .withf(|request| !request.tools.is_empty())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(GenerationOutput::calls(vec![FunctionCall::new(
                    "summon_oracle",
                    json!({}),
                )]))
            });
        generator
            .expect_generate()
            .withf(|request| {
                request.tools.is_empty()
                    && request.contents[0].text.contains("알 수 없는 함수: summon_oracle")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(GenerationOutput::text("요청한 함수는 없습니다.")));

        let outcome = orchestrator(generator).await.run("점을 쳐줘").await.unwrap();
        assert!(!outcome.function_results[0].result.success);
        assert_eq!(outcome.rounds, 2);
    }

    #[tokio::test]
    async fn test_blank_first_round_uses_fixed_text() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_| Ok(GenerationOutput::text("   ")));

        let outcome = orchestrator(generator).await.run("질문").await.unwrap();
        assert_eq!(outcome.final_response, NO_RESPONSE_TEXT);
    }

    #[tokio::test]
    async fn test_resume_rejects_successful_undeclared_function() {
        let mut generator = MockTextGenerator::new();
        generator.expect_generate().never();
        let orchestrator = orchestrator(generator).await;

        let forged = FunctionCallResult::new(
            &FunctionCall::new("summon_oracle", json!({})),
            FunctionOutcome::ok(json!({"answer": 42})),
        );
        assert!(matches!(
            orchestrator.resume_final_round("점을 쳐줘", &[forged]).await,
            Err(AppError::UnknownFunction(message)) if message.contains("summon_oracle")
        ));
    }

    #[tokio::test]
    async fn test_resume_passes_failed_unknown_call_through() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .withf(|request| {
                request.tools.is_empty() && request.contents[0].text.contains("summon_oracle")
            })
            .times(1)
            .returning(|_| Ok(GenerationOutput::text("그런 함수는 없습니다.")));
        let orchestrator = orchestrator(generator).await;

        let failed = executor()
            .await
            .execute(&FunctionCall::new("summon_oracle", json!({})))
            .await;
        let text = orchestrator
            .resume_final_round("점을 쳐줘", &[failed])
            .await
            .unwrap();
        assert_eq!(text, "그런 함수는 없습니다.");
    }

    #[tokio::test]
    async fn test_empty_prompt_is_rejected() {
        let mut generator = MockTextGenerator::new();
        generator.expect_generate().never();
        let orchestrator = orchestrator(generator).await;

        assert!(matches!(
            orchestrator.run("  ").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            orchestrator.final_round("", &[]).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_generation_error_propagates() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Err(AppError::Generation("HTTP 429: quota".into())));

        let err = orchestrator(generator).await.run("질문").await.unwrap_err();
        assert!(err.to_string().contains("HTTP 429"));
    }

    #[test]
    fn test_render_final_prompt() {
        let call = FunctionCall::new(GET_HEXAGRAM_INFO, json!({"number": 1}));
        let result = FunctionCallResult::new(
            &call,
            crate::models::function_call::FunctionOutcome::ok(json!({"name": "중천건"})),
        );
        let rendered = render_final_prompt("질문", &[result]);
        assert!(rendered.contains("함수 get_hexagram_info 실행 결과:\n{\n  \"success\": true"));
        assert!(rendered.ends_with("응답을 생성해주세요."));
    }
}
