//! 文本生成模块
//!
//! 对生成服务的抽象：请求、采样参数、可调用函数声明与输出。
//! 服务层只依赖 [`TextGenerator`]，具体实现见 [`gemini`]。

pub mod gemini;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::config::config::AiConfig;
use crate::error::{AppError, Result};
use crate::models::function_call::FunctionCall;

pub use gemini::GeminiClient;

/// 默认过滤的危害类别
pub const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// 对话角色
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// 一条对话内容
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    pub role: Role,
    pub text: String,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// 安全过滤设置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

/// 采样参数，未设置的字段不下发
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub top_k: Option<u32>,
    pub top_p: Option<f32>,
    pub safety_settings: Vec<SafetySetting>,
}

impl GenerationConfig {
    /// 由服务配置构造默认采样参数
    pub fn from_ai_config(config: &AiConfig) -> Self {
        let safety_settings = config
            .safety_threshold
            .as_ref()
            .map(|threshold| {
                HARM_CATEGORIES
                    .iter()
                    .map(|category| SafetySetting {
                        category: category.to_string(),
                        threshold: threshold.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            temperature: Some(config.temperature),
            max_output_tokens: Some(config.max_output_tokens),
            top_k: config.top_k,
            top_p: config.top_p,
            safety_settings,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }
}

/// 可供生成服务调用的函数声明
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    /// 参数的 JSON Schema（OpenAPI 子集）
    pub parameters: Value,
}

/// 一次生成请求
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub contents: Vec<Content>,
    pub config: GenerationConfig,
    pub tools: Vec<FunctionDeclaration>,
    pub system_instruction: Option<String>,
}

impl GenerationRequest {
    /// 单轮提示
    pub fn prompt(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::conversation(model, vec![Content::user(prompt)])
    }

    /// 多轮对话
    pub fn conversation(model: impl Into<String>, contents: Vec<Content>) -> Self {
        Self {
            model: model.into(),
            contents,
            config: GenerationConfig::default(),
            tools: Vec::new(),
            system_instruction: None,
        }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_tools(mut self, tools: Vec<FunctionDeclaration>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_system_instruction(mut self, instruction: Option<String>) -> Self {
        self.system_instruction = instruction;
        self
    }
}

/// 生成结果：文本与函数调用至少其一
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerationOutput {
    pub text: Option<String>,
    pub function_calls: Vec<FunctionCall>,
}

impl GenerationOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            function_calls: Vec::new(),
        }
    }

    pub fn calls(function_calls: Vec<FunctionCall>) -> Self {
        Self {
            text: None,
            function_calls,
        }
    }

    /// 取出非空文本，否则返回 EmptyResponse
    pub fn into_text(self) -> Result<String> {
        match self.text {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(AppError::EmptyResponse("生成服务未返回文本".to_string())),
        }
    }
}

/// 文本生成服务
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// 发送一次生成请求
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutput>;
}

/// 创建默认的生成服务实现
pub fn create_text_generator(config: &AiConfig) -> Result<Arc<dyn TextGenerator>> {
    Ok(Arc::new(GeminiClient::new(config)?))
}
