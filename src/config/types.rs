//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// TTS 服务配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 播放同步配置
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// 播放器生命周期配置
    #[serde(default)]
    pub player: PlayerConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 请求体大小上限（字节）
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5060
}

fn default_max_body_bytes() -> usize {
    1024 * 1024 // 1 MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// TTS 客户端实现
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsProvider {
    /// 调用外部 HTTP 服务
    #[default]
    Http,
    /// 离线估算时间表
    Fake,
}

/// TTS 服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    #[serde(default)]
    pub provider: TtsProvider,

    /// TTS 服务基础 URL
    #[serde(default = "default_tts_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,
}

fn default_tts_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_tts_timeout() -> u64 {
    30
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            provider: TtsProvider::default(),
            url: default_tts_url(),
            timeout_secs: default_tts_timeout(),
        }
    }
}

/// 播放同步配置
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    /// 高亮循环采样间隔（毫秒）
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,

    /// 末词之后的音频余量（毫秒）
    #[serde(default)]
    pub tail_padding_ms: f64,

    #[serde(default = "default_language")]
    pub default_language: String,

    #[serde(default = "default_speed")]
    pub default_speed: f64,

    #[serde(default = "default_min_speed")]
    pub min_speed: f64,

    #[serde(default = "default_max_speed")]
    pub max_speed: f64,

    /// 单次合成文本的最大字符数
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,
}

fn default_frame_interval() -> u64 {
    16
}

fn default_language() -> String {
    "en".to_string()
}

fn default_speed() -> f64 {
    1.0
}

fn default_min_speed() -> f64 {
    0.5
}

fn default_max_speed() -> f64 {
    2.0
}

fn default_max_text_chars() -> usize {
    5000
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval(),
            tail_padding_ms: 0.0,
            default_language: default_language(),
            default_speed: default_speed(),
            min_speed: default_min_speed(),
            max_speed: default_max_speed(),
            max_text_chars: default_max_text_chars(),
        }
    }
}

/// 播放器生命周期配置
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerConfig {
    /// 空闲超时（秒），超时的播放器被自动关闭
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// 清理任务间隔（秒）
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

fn default_idle_timeout() -> u64 {
    1800 // 30 分钟
}

fn default_cleanup_interval() -> u64 {
    60
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout(),
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
