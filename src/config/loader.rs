use crate::config::config::{AppConfig, StorageBackend};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::PathBuf;

/// 环境变量前缀
const ENV_PREFIX: &str = "WISDOM_";

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从默认路径加载配置
    ///
    /// 优先级（后者覆盖前者）：
    /// 1. 开发环境默认值
    /// 2. ./config.toml
    /// 3. `WISDOM_` 前缀环境变量（层级以 `__` 分隔，如 `WISDOM_AI__MODEL`）
    /// 4. `GOOGLE_API_KEY` / `GEMINI_MODEL`
    pub fn load() -> Result<AppConfig, figment::Error> {
        Self::load_from(default_config_path())
    }

    /// 从指定路径加载配置
    pub fn load_from(path: PathBuf) -> Result<AppConfig, figment::Error> {
        let figment = Figment::from(Serialized::defaults(AppConfig::development()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let mut config: AppConfig = figment.extract()?;
        Self::apply_legacy_env(&mut config);
        Ok(config)
    }

    /// 兼容旧部署使用的变量名
    fn apply_legacy_env(config: &mut AppConfig) {
        if config.ai.api_key.is_empty() {
            if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
                config.ai.api_key = key;
            }
        }
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            if !model.trim().is_empty() {
                config.ai.model = model;
            }
        }
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.server.port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }

        if config.database.backend == StorageBackend::SurrealDB && config.database.url.is_empty()
        {
            return Err(ConfigValidationError::MissingDatabaseUrl);
        }

        if config.ai.model.trim().is_empty() {
            return Err(ConfigValidationError::MissingModel);
        }

        if !(0.0..=2.0).contains(&config.ai.temperature) {
            return Err(ConfigValidationError::InvalidTemperature(
                config.ai.temperature,
            ));
        }

        Ok(())
    }
}

/// 配置验证错误
#[derive(thiserror::Error, Debug)]
pub enum ConfigValidationError {
    #[error("服务端口无效，必须大于 0")]
    InvalidPort,

    #[error("数据库连接 URL 未配置")]
    MissingDatabaseUrl,

    #[error("生成模型名称未配置")]
    MissingModel,

    #[error("采样温度超出范围 [0, 2]: {0}")]
    InvalidTemperature(f32),
}

/// 获取默认配置文件路径
pub fn default_config_path() -> PathBuf {
    PathBuf::from("config.toml")
}

/// 检查配置文件是否存在
pub fn config_exists() -> bool {
    default_config_path().exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_config_is_valid() {
        assert!(ConfigLoader::validate(&AppConfig::development()).is_ok());
        assert!(ConfigLoader::validate(&AppConfig::testing()).is_ok());
    }

    #[test]
    fn test_rejects_zero_port() {
        let mut config = AppConfig::development();
        config.server.port = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidPort)
        ));
    }

    #[test]
    fn test_memory_backend_needs_no_url() {
        let mut config = AppConfig::testing();
        config.database.url.clear();
        assert!(ConfigLoader::validate(&config).is_ok());

        config.database.backend = StorageBackend::SurrealDB;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::MissingDatabaseUrl)
        ));
    }

    #[test]
    fn test_rejects_out_of_range_temperature() {
        let mut config = AppConfig::development();
        config.ai.temperature = 3.5;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidTemperature(_))
        ));
    }

    #[test]
    fn test_load_from_toml_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "wisdom.toml",
                r#"
                [server]
                port = 9090

                [database]
                backend = "memory"

                [ai]
                model = "gemini-test"
                "#,
            )?;
            jail.set_env("WISDOM_AI__TEMPERATURE", "0.5");

            let config = ConfigLoader::load_from(PathBuf::from("wisdom.toml"))?;
            assert_eq!(config.server.port, 9090);
            assert_eq!(config.database.backend, StorageBackend::Memory);
            assert_eq!(config.ai.model, "gemini-test");
            assert!((config.ai.temperature - 0.5).abs() < f32::EPSILON);
            // 未覆盖的字段保留默认值
            assert_eq!(config.ai.max_output_tokens, 2048);
            Ok(())
        });
    }
}
