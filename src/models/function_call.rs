//! 函数调用模型
//!
//! 生成服务请求的函数调用，以及本地执行后的结果。

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 生成服务请求的一次函数调用
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    /// 函数名
    pub name: String,
    /// 参数（JSON 对象）
    #[serde(default)]
    pub args: Value,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// 函数执行失败的类别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FunctionErrorKind {
    /// 参数缺失或不合法
    InvalidArguments,
    /// 引用的卦不存在
    NotFound,
    /// 未声明的函数
    UnknownFunction,
    /// 存储等内部错误
    Internal,
}

/// 函数执行结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FunctionErrorKind>,
}

impl FunctionOutcome {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_kind: None,
        }
    }

    pub fn failure(kind: FunctionErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            error_kind: Some(kind),
        }
    }
}

/// 一次函数调用及其结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCallResult {
    pub name: String,
    pub args: Value,
    pub result: FunctionOutcome,
}

impl FunctionCallResult {
    pub fn new(call: &FunctionCall, result: FunctionOutcome) -> Self {
        Self {
            name: call.name.clone(),
            args: call.args.clone(),
            result,
        }
    }
}
