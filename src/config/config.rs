use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 存储后端类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// SurrealDB（支持 ws://、http://、mem:// 等地址）
    #[default]
    SurrealDB,
    /// 进程内存储，用于开发与测试
    Memory,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 存储后端
    pub backend: StorageBackend,
    /// SurrealDB 连接地址
    pub url: String,
    /// 命名空间
    pub namespace: String,
    /// 数据库名称
    pub database: String,
    /// 用户名（为空时跳过认证）
    pub username: String,
    /// 密码
    pub password: String,
    /// 启动时若卦库为空则写入内置 64 卦
    pub seed_on_startup: bool,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务地址
    pub host: String,
    /// 服务端口
    pub port: u16,
    /// 请求超时（秒）
    pub request_timeout_secs: u64,
    /// 允许的跨域来源，为空表示任意来源
    pub cors_origins: Vec<String>,
}

/// 生成服务（Gemini）配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AiConfig {
    /// API 基础地址
    pub base_url: String,
    /// API 密钥
    pub api_key: String,
    /// 模型名称
    pub model: String,
    /// 采样温度
    pub temperature: f32,
    /// 最大输出 token 数
    pub max_output_tokens: u32,
    /// top-k 采样
    pub top_k: Option<u32>,
    /// top-p 采样
    pub top_p: Option<f32>,
    /// HTTP 请求超时（秒）
    pub timeout_secs: u64,
    /// 批量生成视角时两次调用之间的间隔（毫秒）
    pub perspective_delay_ms: u64,
    /// 系统指令
    pub system_instruction: Option<String>,
    /// 安全过滤阈值，原样透传给生成服务
    pub safety_threshold: Option<String>,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 结构化日志格式
    pub structured: bool,
    /// 日志文件目录
    pub log_dir: Option<PathBuf>,
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// 数据库配置
    pub database: DatabaseConfig,
    /// 服务器配置
    pub server: ServerConfig,
    /// 生成服务配置
    pub ai: AiConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 应用名称
    pub app_name: String,
    /// 环境
    pub environment: String,
}

impl AppConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        Self {
            database: DatabaseConfig {
                backend: StorageBackend::SurrealDB,
                url: "ws://localhost:8000".into(),
                namespace: "wisdom_lenses".into(),
                database: "thinking_lenses".into(),
                username: "root".into(),
                password: "root".into(),
                seed_on_startup: true,
            },
            server: ServerConfig {
                host: "0.0.0.0".into(),
                port: 3000,
                request_timeout_secs: 120,
                cors_origins: Vec::new(),
            },
            ai: AiConfig {
                base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
                api_key: String::new(),
                model: "gemini-2.5-flash-preview-05-20".into(),
                temperature: 0.9,
                max_output_tokens: 2048,
                top_k: Some(1),
                top_p: Some(1.0),
                timeout_secs: 90,
                perspective_delay_ms: 500,
                system_instruction: None,
                safety_threshold: Some("BLOCK_MEDIUM_AND_ABOVE".into()),
            },
            logging: LoggingConfig {
                level: "debug".into(),
                structured: false,
                log_dir: None,
            },
            app_name: "wisdom-lenses".into(),
            environment: "development".into(),
        }
    }

    /// 创建测试配置（进程内存储，无批量间隔）
    pub fn testing() -> Self {
        let mut config = Self::development();
        config.environment = "test".into();
        config.database.backend = StorageBackend::Memory;
        config.database.url = "mem://".into();
        config.ai.api_key = "test-key".into();
        config.ai.perspective_delay_ms = 0;
        config
    }

    /// 创建生产环境配置
    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = "production".into();
        config.logging.level = "info".into();
        config.logging.structured = true;
        config.database.seed_on_startup = false;
        config
    }
}
