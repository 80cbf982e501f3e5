//! Readaloud - TTS 朗读与逐词高亮同步服务
//!
//! 启动流程：配置 → 日志 → TTS 客户端 → 播放器注册表 → HTTP 服务

use std::sync::Arc;
use std::time::Duration;

use readaloud::application::{PlaybackDeps, PlayerRegistryPort, SpeechSynthesisPort};
use readaloud::config::{load_config, print_config, AppConfig, TtsProvider};
use readaloud::infrastructure::adapters::{
    ClockAudioBinder, FakeSpeechClient, FakeSpeechClientConfig, HttpSpeechClient,
    HttpSpeechClientConfig, IntervalFrameScheduler,
};
use readaloud::infrastructure::events::EventPublisher;
use readaloud::infrastructure::http::{AppState, HttpServer, ServerConfig};
use readaloud::infrastructure::memory::InMemoryPlayerRegistry;

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},readaloud={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_synthesizer(config: &AppConfig) -> anyhow::Result<Arc<dyn SpeechSynthesisPort>> {
    Ok(match config.tts.provider {
        TtsProvider::Http => {
            let tts_config =
                HttpSpeechClientConfig::new(&config.tts.url).with_timeout(config.tts.timeout_secs);
            Arc::new(HttpSpeechClient::new(tts_config)?)
        }
        TtsProvider::Fake => Arc::new(FakeSpeechClient::new(FakeSpeechClientConfig {
            base_url: config.tts.url.clone(),
            min_speed: config.playback.min_speed,
            max_speed: config.playback.max_speed,
            ..Default::default()
        })),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("Readaloud - TTS playback and word highlight service");
    print_config(&config);

    let synthesizer = build_synthesizer(&config)?;
    if !synthesizer.health_check().await {
        tracing::warn!(url = %config.tts.url, "TTS service is not reachable yet");
    }

    let event_publisher = Arc::new(EventPublisher::new());
    let deps = PlaybackDeps {
        synthesizer,
        binder: Arc::new(ClockAudioBinder::new(config.playback.tail_padding_ms)),
        scheduler: Arc::new(IntervalFrameScheduler::from_millis(
            config.playback.frame_interval_ms,
        )),
        events: event_publisher.clone(),
    };

    // 播放器注册表 + 空闲清理
    let registry = InMemoryPlayerRegistry::new(event_publisher).arc();
    let cleanup_shutdown = registry.start_cleanup_task(
        Duration::from_secs(config.player.cleanup_interval_secs),
        config.player.idle_timeout_secs,
    );

    let state = AppState::new(registry.clone(), deps, config.playback.clone());
    let server = HttpServer::new(ServerConfig::from(&config.server), state);

    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    let _ = cleanup_shutdown.send(true);
    for player_id in registry.list_all() {
        let _ = registry.close(&player_id);
    }

    tracing::info!("Server shutdown complete");

    Ok(())
}
