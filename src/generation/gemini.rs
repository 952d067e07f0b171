//! Gemini 客户端
//!
//! 通过 `models/{model}:generateContent` 接口调用 Gemini。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::{
    FunctionDeclaration, GenerationConfig, GenerationOutput, GenerationRequest, Role,
    SafetySetting, TextGenerator,
};
use crate::config::config::AiConfig;
use crate::error::{AppError, Result};
use crate::models::function_call::FunctionCall;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest<'a> {
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<WireGenerationConfig>,
    #[serde(skip_serializing_if = "is_empty_slice")]
    safety_settings: &'a [SafetySetting],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

impl WireGenerationConfig {
    fn from_config(config: &GenerationConfig) -> Option<Self> {
        let wire = Self {
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            top_k: config.top_k,
            top_p: config.top_p,
        };
        let empty = wire.temperature.is_none()
            && wire.max_output_tokens.is_none()
            && wire.top_k.is_none()
            && wire.top_p.is_none();
        (!empty).then_some(wire)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireTool<'a> {
    function_declarations: &'a [FunctionDeclaration],
}

#[derive(Serialize, Deserialize, Default)]
struct WireContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<WireFunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
}

#[derive(Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
    #[serde(default)]
    prompt_feedback: Option<WirePromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCandidate {
    #[serde(default)]
    content: Option<WireContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

fn is_empty_slice<T>(items: &&[T]) -> bool {
    items.is_empty()
}

fn text_content(role: Option<&str>, text: &str) -> WireContent {
    WireContent {
        role: role.map(str::to_string),
        parts: vec![WirePart {
            text: Some(text.to_string()),
            ..Default::default()
        }],
    }
}

/// Gemini 客户端
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    /// 创建客户端
    pub fn new(config: &AiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| AppError::Config(format!("无法创建 HTTP 客户端: {}", e)))?;

        if config.api_key.is_empty() {
            tracing::warn!("Gemini API key is not configured; generation calls will be rejected");
        }

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    fn build_body<'a>(request: &'a GenerationRequest) -> WireRequest<'a> {
        let contents = request
            .contents
            .iter()
            .map(|content| {
                let role = match content.role {
                    Role::User => "user",
                    Role::Model => "model",
                };
                text_content(Some(role), &content.text)
            })
            .collect();

        let tools = if request.tools.is_empty() {
            Vec::new()
        } else {
            vec![WireTool {
                function_declarations: &request.tools,
            }]
        };

        WireRequest {
            contents,
            generation_config: WireGenerationConfig::from_config(&request.config),
            safety_settings: &request.config.safety_settings,
            tools,
            system_instruction: request
                .system_instruction
                .as_deref()
                .map(|text| text_content(None, text)),
        }
    }

    fn into_output(response: WireResponse) -> Result<GenerationOutput> {
        let block_reason = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason);
        let Some(candidate) = response.candidates.into_iter().next() else {
            return Err(AppError::EmptyResponse(format!(
                "没有候选结果{}",
                block_reason
                    .map(|reason| format!("（{}）", reason))
                    .unwrap_or_default()
            )));
        };

        let mut texts = Vec::new();
        let mut function_calls = Vec::new();
        for part in candidate.content.unwrap_or_default().parts {
            if let Some(call) = part.function_call {
                function_calls.push(FunctionCall::new(call.name, call.args));
            } else if let Some(text) = part.text {
                if part.thought != Some(true) {
                    texts.push(text);
                }
            }
        }

        let text = texts.concat();
        let text = (!text.trim().is_empty()).then_some(text);
        if text.is_none() && function_calls.is_empty() {
            return Err(AppError::EmptyResponse(format!(
                "候选结果不含文本或函数调用（finish_reason: {}）",
                candidate.finish_reason.as_deref().unwrap_or("UNKNOWN")
            )));
        }

        Ok(GenerationOutput {
            text,
            function_calls,
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutput> {
        if self.api_key.is_empty() {
            return Err(AppError::Config("GOOGLE_API_KEY 未配置".to_string()));
        }

        let body = Self::build_body(request);
        tracing::debug!(
            model = %request.model,
            contents = request.contents.len(),
            tools = request.tools.len(),
            "Sending generation request"
        );

        let response = self
            .client
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "Generation request failed");
            return Err(AppError::Generation(format!(
                "HTTP {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        let wire: WireResponse = response.json().await?;
        let output = Self::into_output(wire)?;
        tracing::debug!(
            has_text = output.text.is_some(),
            function_calls = output.function_calls.len(),
            "Generation request completed"
        );
        Ok(output)
    }
}
