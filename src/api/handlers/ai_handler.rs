//! AI API Handlers
//!
//! 六视角生成与函数调用两轮协议。

use axum::{Json, extract::State, response::IntoResponse};
use tracing::debug;
use validator::Validate;

use crate::{
    api::{app_state::AppState, dto::ai_dto::*},
    error::AppError,
    services::advisor::AdviceRequest,
    services::orchestrator::FirstRound,
    services::perspective::PerspectiveResponse,
};

/// 生成单个或全部视角
///
/// POST /api/v1/ai/perspectives
pub async fn generate_perspectives(
    State(state): State<AppState>,
    Json(request): Json<PerspectiveRequest>,
) -> Result<axum::response::Response, AppError> {
    request.validate()?;
    debug!(
        hexagram = request.hexagram_number,
        perspective = request.perspective.as_deref().unwrap_or("all"),
        "Generating perspectives"
    );

    let response = state
        .perspective_service
        .generate(
            request.hexagram_number,
            &request.user_situation,
            request.perspective.as_deref(),
        )
        .await?;

    Ok(match response {
        PerspectiveResponse::Single(result) => Json(result).into_response(),
        PerspectiveResponse::All(batch) => Json(AllPerspectivesResponse::from(batch)).into_response(),
    })
}

/// 完整执行函数调用两轮
///
/// POST /api/v1/ai/function-calling
pub async fn function_calling(
    State(state): State<AppState>,
    Json(request): Json<FunctionCallingRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    debug!("Running function calling");
    Ok(Json(state.orchestrator.run(&request.prompt).await?))
}

/// 第一轮：返回模型的直接回答或函数调用及其执行结果
///
/// POST /api/v1/ai/function-calling/first
pub async fn function_calling_first(
    State(state): State<AppState>,
    Json(request): Json<FunctionCallingRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let response = match state.orchestrator.first_round(&request.prompt).await? {
        FirstRound::Direct(text) => FirstRoundResponse {
            prompt: request.prompt,
            response: Some(text),
            function_calls: Vec::new(),
            needs_function_execution: false,
            function_results: Vec::new(),
        },
        FirstRound::FunctionCalls(calls) => {
            let function_results = state.orchestrator.execute_calls(&calls).await;
            FirstRoundResponse {
                prompt: request.prompt,
                response: None,
                function_calls: calls,
                needs_function_execution: true,
                function_results,
            }
        }
    };
    debug!(
        calls = response.function_calls.len(),
        "First function calling round finished"
    );
    Ok(Json(response))
}

/// 第二轮：以函数执行结果生成最终回答
///
/// POST /api/v1/ai/function-calling/final
pub async fn function_calling_final(
    State(state): State<AppState>,
    Json(request): Json<FinalRoundRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    debug!(results = request.function_results.len(), "Running final round");

    let final_response = state
        .orchestrator
        .resume_final_round(&request.prompt, &request.function_results)
        .await?;
    Ok(Json(FinalRoundResponse {
        prompt: request.prompt,
        final_response,
    }))
}

/// 可供模型调用的函数
///
/// GET /api/v1/ai/functions
pub async fn list_functions(State(state): State<AppState>) -> impl IntoResponse {
    Json(FunctionsResponse {
        functions: state.function_executor.declarations(),
    })
}

/// 推荐一卦，或为骰出的卦给出建议
///
/// POST /api/v1/analyze
pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Analyzing user situation");
    let result = state.advisor.analyze(&AdviceRequest::from(request)).await?;
    Ok(Json(result))
}
