//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// # 环境变量示例
/// - `READALOUD_SERVER__PORT=8080`
/// - `READALOUD_TTS__URL=http://tts-server:8000`
/// - `READALOUD_TTS__PROVIDER=fake`
/// - `READALOUD_PLAYBACK__FRAME_INTERVAL_MS=33`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// `config_path` 为 None 时搜索当前目录下的 config / config.local
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5060)?
        .set_default("server.max_body_bytes", 1024 * 1024)?
        .set_default("tts.provider", "http")?
        .set_default("tts.url", "http://localhost:8000")?
        .set_default("tts.timeout_secs", 30)?
        .set_default("playback.frame_interval_ms", 16)?
        .set_default("playback.tail_padding_ms", 0.0)?
        .set_default("playback.default_language", "en")?
        .set_default("playback.default_speed", 1.0)?
        .set_default("playback.min_speed", 0.5)?
        .set_default("playback.max_speed", 2.0)?
        .set_default("playback.max_text_chars", 5000)?
        .set_default("player.idle_timeout_secs", 1800)?
        .set_default("player.cleanup_interval_secs", 60)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 前缀 READALOUD_，层级分隔符 __
    builder = builder.add_source(
        Environment::with_prefix("READALOUD")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.tts.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS URL cannot be empty".to_string(),
        ));
    }

    let playback = &config.playback;
    if playback.frame_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "Frame interval cannot be 0".to_string(),
        ));
    }
    if !(playback.min_speed > 0.0 && playback.min_speed <= playback.max_speed) {
        return Err(ConfigError::ValidationError(format!(
            "Invalid speed range: {} - {}",
            playback.min_speed, playback.max_speed
        )));
    }
    if !(playback.min_speed..=playback.max_speed).contains(&playback.default_speed) {
        return Err(ConfigError::ValidationError(format!(
            "Default speed {} outside {} - {}",
            playback.default_speed, playback.min_speed, playback.max_speed
        )));
    }
    if !playback.tail_padding_ms.is_finite() || playback.tail_padding_ms < 0.0 {
        return Err(ConfigError::ValidationError(
            "Tail padding must be a non-negative number".to_string(),
        ));
    }

    if config.player.cleanup_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Player cleanup interval cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("TTS Provider: {:?}", config.tts.provider);
    tracing::info!("TTS URL: {}", config.tts.url);
    tracing::info!("TTS Timeout: {}s", config.tts.timeout_secs);
    tracing::info!("Frame Interval: {}ms", config.playback.frame_interval_ms);
    tracing::info!(
        "Speed Range: {} - {} (default {})",
        config.playback.min_speed,
        config.playback.max_speed,
        config.playback.default_speed
    );
    tracing::info!("Player Idle Timeout: {}s", config.player.idle_timeout_secs);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TtsProvider;
    use std::io::Write;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_tts_url() {
        let mut config = AppConfig::default();
        config.tts.url = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_frame_interval() {
        let mut config = AppConfig::default();
        config.playback.frame_interval_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_inverted_speed_range() {
        let mut config = AppConfig::default();
        config.playback.min_speed = 2.0;
        config.playback.max_speed = 0.5;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9090

[tts]
provider = "fake"
url = "http://tts.internal:8000"

[playback]
frame_interval_ms = 33
tail_padding_ms = 120.0
"#
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.tts.provider, TtsProvider::Fake);
        assert_eq!(config.tts.url, "http://tts.internal:8000");
        assert_eq!(config.playback.frame_interval_ms, 33);
        assert_eq!(config.playback.tail_padding_ms, 120.0);
        assert_eq!(config.playback.max_speed, 2.0);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[playback]\nframe_interval_ms = 0").unwrap();

        let err = load_config_from_path(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }
}
