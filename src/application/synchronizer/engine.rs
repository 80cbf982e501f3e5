//! Playback Synchronizer Engine
//!
//! 状态机: Idle → Loading → Ready → Playing/Paused → Ended，失败进入 Error。
//! 除 `generate_speech` 外所有操作均为同步调用；`play()` 会在当前 Tokio
//! 运行时上启动高亮循环任务。

use std::sync::Arc;

use parking_lot::Mutex;

use super::highlight_loop::{run_highlight_loop, LoopContext};
use super::session::{PlaybackSession, SyncState};
use crate::application::error::PlaybackError;
use crate::application::ports::{
    AudioBinderPort, AudioResourcePort, FrameSchedulerPort, SpeechRequest, SpeechResponse,
    SpeechSynthesisPort,
};
use crate::domain::playback::{
    render_highlighted_html, words_with_status, Cursor, PlaybackSnapshot, PlaybackState,
    WordStatus,
};
use crate::domain::timing::{TimingTable, WordInterval};
use crate::infrastructure::events::EventPublisher;

/// 同步器依赖的端口集合
#[derive(Clone)]
pub struct PlaybackDeps {
    pub synthesizer: Arc<dyn SpeechSynthesisPort>,
    pub binder: Arc<dyn AudioBinderPort>,
    pub scheduler: Arc<dyn FrameSchedulerPort>,
    pub events: Arc<EventPublisher>,
}

/// 播放同步器
///
/// 独占 PlaybackSession 与 TimingTable；调用方只拿到只读快照
pub struct PlaybackSynchronizer {
    player_id: String,
    deps: PlaybackDeps,
    shared: Arc<Mutex<SyncState>>,
}

impl PlaybackSynchronizer {
    pub fn new(player_id: impl Into<String>, deps: PlaybackDeps) -> Self {
        Self {
            player_id: player_id.into(),
            deps,
            shared: Arc::new(Mutex::new(SyncState::new())),
        }
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    // ========================================================================
    // 生命周期操作
    // ========================================================================

    /// 请求合成并建立新的播放会话
    ///
    /// 旧会话（音频资源、时间表、光标）在进入 Loading 前释放。
    /// Loading 期间的再次调用直接拒绝，不排队；失败不自动重试。
    pub async fn generate_speech(
        &self,
        text: &str,
        language: &str,
        speed: f64,
    ) -> Result<Arc<TimingTable>, PlaybackError> {
        let session_id = {
            let mut shared = self.shared.lock();
            if text.trim().is_empty() {
                return Err(self.record(
                    &mut shared,
                    PlaybackError::invalid_request("text must not be empty"),
                ));
            }
            if shared.state == PlaybackState::Loading {
                return Err(self.record(&mut shared, PlaybackError::ConcurrentGenerationRejected));
            }

            if let Some(previous) = shared.session.take() {
                previous.teardown();
            }
            shared.generation += 1;
            shared.last_error = None;
            shared.transition(PlaybackState::Loading, &self.deps.events, &self.player_id);
            shared.generation
        };

        tracing::info!(
            player_id = %self.player_id,
            session_id = session_id,
            text_len = text.len(),
            language = %language,
            speed = speed,
            "Generating speech"
        );

        let outcome = self
            .synthesize_and_bind(SpeechRequest::new(text, language, speed))
            .await;

        let mut guard = self.shared.lock();
        let shared = &mut *guard;

        // 生成期间播放器被关闭
        if shared.generation != session_id || shared.state != PlaybackState::Loading {
            if let Ok((_, resource)) = &outcome {
                resource.release();
            }
            tracing::debug!(
                player_id = %self.player_id,
                session_id = session_id,
                "Generation result discarded (player closed)"
            );
            return Err(PlaybackError::RequestFailure(
                "generation cancelled: player closed".to_string(),
            ));
        }

        match outcome {
            Ok((response, resource)) => {
                let timings = Arc::new(response.timings);
                shared.last_error = None;
                let duration_ms = resource
                    .duration_ms()
                    .unwrap_or_else(|| timings.total_duration_ms());
                shared.session = Some(PlaybackSession::new(
                    session_id,
                    resource,
                    timings.clone(),
                    response.audio_url.clone(),
                ));
                shared.transition(PlaybackState::Ready, &self.deps.events, &self.player_id);
                self.deps.events.publish_generation_completed(
                    &self.player_id,
                    session_id,
                    &response.audio_url,
                    timings.len(),
                    duration_ms,
                );

                tracing::info!(
                    player_id = %self.player_id,
                    session_id = session_id,
                    audio_id = ?response.audio_id,
                    audio_url = %response.audio_url,
                    total_words = timings.len(),
                    duration_ms = duration_ms,
                    "Speech ready"
                );
                Ok(timings)
            }
            Err(err) => {
                let err = self.record(shared, err);
                shared.transition(PlaybackState::Error, &self.deps.events, &self.player_id);
                self.deps.events.publish_generation_failed(
                    &self.player_id,
                    err.kind(),
                    &err.to_string(),
                );
                Err(err)
            }
        }
    }

    /// 开始或继续播放
    ///
    /// Ready/Paused/Ended → Playing；已在播放时为空操作
    pub fn play(&self) -> Result<(), PlaybackError> {
        let mut guard = self.shared.lock();
        let shared = &mut *guard;

        let Some(session) = shared.session.as_mut() else {
            return Err(self.record(shared, PlaybackError::NoBoundResource));
        };
        if shared.state == PlaybackState::Playing {
            return Ok(());
        }

        if let Err(e) = session.resource.play() {
            return Err(self.record(shared, e.into()));
        }

        let token = session.start_loop();
        let ctx = LoopContext {
            player_id: self.player_id.clone(),
            session_id: session.id,
            shared: self.shared.clone(),
            scheduler: self.deps.scheduler.clone(),
            events: self.deps.events.clone(),
            token,
        };
        shared.transition(PlaybackState::Playing, &self.deps.events, &self.player_id);
        tokio::spawn(run_highlight_loop(ctx));

        Ok(())
    }

    /// 暂停播放，保留光标
    ///
    /// 资源在下一次采样前已播放完毕时，以结束为准进入 Ended
    pub fn pause(&self) -> Result<(), PlaybackError> {
        let mut guard = self.shared.lock();
        let shared = &mut *guard;

        let Some(session) = shared.session.as_mut() else {
            return Err(self.record(shared, PlaybackError::NoBoundResource));
        };
        if shared.state != PlaybackState::Playing {
            return Ok(());
        }
        if session.resource.is_ended() {
            shared.mark_ended(&self.deps.events, &self.player_id);
            tracing::info!(player_id = %self.player_id, "Playback ended before pause");
            return Ok(());
        }

        session.resource.pause();
        session.cancel_loop();
        shared.transition(PlaybackState::Paused, &self.deps.events, &self.player_id);
        Ok(())
    }

    /// 停止播放：位置归零、清除光标、回到 Ready
    pub fn stop(&self) -> Result<(), PlaybackError> {
        let mut guard = self.shared.lock();
        let shared = &mut *guard;

        let Some(session) = shared.session.as_mut() else {
            return Err(self.record(shared, PlaybackError::NoBoundResource));
        };

        session.cancel_loop();
        session.resource.pause();
        session.resource.set_position_ms(0.0);
        if session.move_cursor(None) {
            shared.publish_cursor(&self.deps.events, &self.player_id);
        }
        shared.transition(PlaybackState::Ready, &self.deps.events, &self.player_id);
        Ok(())
    }

    /// 跳转到 `time_ms`，立即按新位置重新解析光标
    pub fn seek(&self, time_ms: f64) -> Result<(), PlaybackError> {
        let mut guard = self.shared.lock();
        let shared = &mut *guard;

        if !time_ms.is_finite() {
            return Err(self.record(
                shared,
                PlaybackError::invalid_request(format!("seek position must be finite, got {}", time_ms)),
            ));
        }
        let Some(session) = shared.session.as_mut() else {
            return Err(self.record(shared, PlaybackError::NoBoundResource));
        };

        session.resource.set_position_ms(time_ms.max(0.0));
        let position_ms = session.resource.position_ms();
        let index = session.timings.lookup(position_ms);
        let session_id = session.id;
        if session.move_cursor(index) {
            shared.publish_cursor(&self.deps.events, &self.player_id);
        }
        if shared.state == PlaybackState::Ended {
            shared.transition(PlaybackState::Paused, &self.deps.events, &self.player_id);
        }

        tracing::debug!(
            player_id = %self.player_id,
            session_id = session_id,
            requested_ms = time_ms,
            position_ms = position_ms,
            index = ?index,
            "Seeked"
        );
        Ok(())
    }

    /// 设置播放速率
    ///
    /// 只改变音频资源的速率，不缩放时间表
    pub fn set_playback_rate(&self, rate: f64) -> Result<(), PlaybackError> {
        let mut guard = self.shared.lock();
        let shared = &mut *guard;

        if !rate.is_finite() || rate <= 0.0 {
            return Err(self.record(
                shared,
                PlaybackError::invalid_request(format!("playback rate must be positive, got {}", rate)),
            ));
        }
        let Some(session) = shared.session.as_mut() else {
            return Err(self.record(shared, PlaybackError::NoBoundResource));
        };

        if let Err(e) = session.resource.set_playback_rate(rate) {
            return Err(self.record(shared, e.into()));
        }
        session.rate = rate;
        let session_id = session.id;
        self.deps
            .events
            .publish_rate_changed(&self.player_id, session_id, rate);

        tracing::debug!(
            player_id = %self.player_id,
            session_id = session_id,
            rate = rate,
            "Playback rate changed"
        );
        Ok(())
    }

    /// 关闭播放器：释放会话并回到 Idle，使进行中的生成结果作废
    pub fn shutdown(&self, reason: &str) {
        let mut shared = self.shared.lock();
        if let Some(session) = shared.session.take() {
            session.teardown();
        }
        shared.generation += 1;
        shared.transition(PlaybackState::Idle, &self.deps.events, &self.player_id);
        self.deps
            .events
            .publish_player_closed(&self.player_id, reason);

        tracing::info!(player_id = %self.player_id, reason = %reason, "Player shut down");
    }

    // ========================================================================
    // 只读访问
    // ========================================================================

    pub fn state(&self) -> PlaybackState {
        self.shared.lock().state
    }

    pub fn cursor(&self) -> Cursor {
        self.shared.lock().session.as_ref().and_then(|s| s.cursor)
    }

    pub fn session_id(&self) -> Option<u64> {
        self.shared.lock().session.as_ref().map(|s| s.id)
    }

    /// 当前时间表，无会话时为空表
    pub fn timing_table(&self) -> Arc<TimingTable> {
        self.shared
            .lock()
            .session
            .as_ref()
            .map(|s| s.timings.clone())
            .unwrap_or_default()
    }

    pub fn current_word(&self) -> Option<WordInterval> {
        self.shared
            .lock()
            .session
            .as_ref()
            .and_then(|s| s.current_word().cloned())
    }

    /// 已播放的媒体时间（毫秒）
    pub fn elapsed_ms(&self) -> f64 {
        self.shared
            .lock()
            .session
            .as_ref()
            .map(|s| s.resource.position_ms())
            .unwrap_or(0.0)
    }

    /// 音频总时长（毫秒），资源未知时退回时间表末尾
    pub fn total_duration_ms(&self) -> f64 {
        self.shared
            .lock()
            .session
            .as_ref()
            .map(|s| {
                s.resource
                    .duration_ms()
                    .unwrap_or_else(|| s.timings.total_duration_ms())
            })
            .unwrap_or(0.0)
    }

    pub fn playback_rate(&self) -> f64 {
        self.shared
            .lock()
            .session
            .as_ref()
            .map(|s| s.rate)
            .unwrap_or(1.0)
    }

    pub fn last_error(&self) -> Option<PlaybackError> {
        self.shared.lock().last_error.clone()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let shared = self.shared.lock();
        let session = shared.session.as_ref();
        PlaybackSnapshot {
            state: shared.state,
            session_id: session.map(|s| s.id),
            cursor: session.and_then(|s| s.cursor),
            current_word: session.and_then(|s| s.current_word().map(|w| w.word.clone())),
            elapsed_ms: session.map(|s| s.resource.position_ms()).unwrap_or(0.0),
            total_duration_ms: session
                .map(|s| {
                    s.resource
                        .duration_ms()
                        .unwrap_or_else(|| s.timings.total_duration_ms())
                })
                .unwrap_or(0.0),
            playback_rate: session.map(|s| s.rate).unwrap_or(1.0),
            total_words: session.map(|s| s.timings.len()).unwrap_or(0),
            audio_url: session.map(|s| s.audio_url.clone()),
            last_error: shared.last_error.as_ref().map(|e| e.to_string()),
            generated_at: session.map(|s| s.created_at),
        }
    }

    pub fn words_with_status(&self) -> Vec<WordStatus> {
        let (timings, cursor) = self.table_and_cursor();
        words_with_status(&timings, cursor)
    }

    pub fn highlighted_html(&self) -> String {
        let (timings, cursor) = self.table_and_cursor();
        render_highlighted_html(&timings, cursor)
    }

    // ========================================================================
    // 内部
    // ========================================================================

    fn table_and_cursor(&self) -> (Arc<TimingTable>, Cursor) {
        let shared = self.shared.lock();
        match shared.session.as_ref() {
            Some(s) => (s.timings.clone(), s.cursor),
            None => (Arc::default(), None),
        }
    }

    async fn synthesize_and_bind(
        &self,
        request: SpeechRequest,
    ) -> Result<(SpeechResponse, Arc<dyn AudioResourcePort>), PlaybackError> {
        let response = self.deps.synthesizer.synthesize(request).await?;
        let resource = self
            .deps
            .binder
            .bind(&response.audio_url, &response.timings)
            .await?;
        Ok((response, resource))
    }

    /// 记录错误并返回
    fn record(&self, shared: &mut SyncState, err: PlaybackError) -> PlaybackError {
        tracing::warn!(
            player_id = %self.player_id,
            state = %shared.state,
            kind = err.kind(),
            error = %err,
            "Playback operation failed"
        );
        shared.last_error = Some(err.clone());
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::SynthesisError;
    use crate::domain::timing::{RawWordTiming, TimingError};
    use crate::infrastructure::adapters::{ClockAudioBinder, IntervalFrameScheduler};
    use crate::infrastructure::events::PlaybackEvent;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::broadcast;

    /// 按顺序返回预设结果的合成服务
    struct ScriptedSynthesizer {
        responses: Mutex<VecDeque<Result<SpeechResponse, SynthesisError>>>,
        latency: Duration,
        calls: AtomicUsize,
    }

    impl ScriptedSynthesizer {
        fn new(
            responses: Vec<Result<SpeechResponse, SynthesisError>>,
            latency: Duration,
        ) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                latency,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SpeechSynthesisPort for ScriptedSynthesizer {
        async fn synthesize(
            &self,
            _request: SpeechRequest,
        ) -> Result<SpeechResponse, SynthesisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            self.responses
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(SynthesisError::ServiceError("no script left".into())))
        }
    }

    fn hi_there() -> SpeechResponse {
        SpeechResponse {
            audio_url: "http://localhost:8000/audio/hi.mp3".to_string(),
            audio_id: Some("hi".to_string()),
            timings: TimingTable::from_raw(vec![
                RawWordTiming::new("Hi", 0.0, 500.0),
                RawWordTiming::new("there", 600.0, 1000.0),
            ])
            .unwrap(),
        }
    }

    fn second_take() -> SpeechResponse {
        SpeechResponse {
            audio_url: "http://localhost:8000/audio/again.mp3".to_string(),
            audio_id: None,
            timings: TimingTable::from_raw(vec![
                RawWordTiming::new("Once", 0.0, 400.0),
                RawWordTiming::new("more", 400.0, 800.0),
                RawWordTiming::new("please", 900.0, 1500.0),
            ])
            .unwrap(),
        }
    }

    fn synchronizer(
        synthesizer: Arc<ScriptedSynthesizer>,
    ) -> (Arc<PlaybackSynchronizer>, broadcast::Receiver<PlaybackEvent>) {
        synchronizer_with_frame(synthesizer, 10)
    }

    fn synchronizer_with_frame(
        synthesizer: Arc<ScriptedSynthesizer>,
        frame_ms: u64,
    ) -> (Arc<PlaybackSynchronizer>, broadcast::Receiver<PlaybackEvent>) {
        let events = Arc::new(EventPublisher::with_capacity(4096));
        let rx = events.register_player("test-player");
        let deps = PlaybackDeps {
            synthesizer,
            binder: Arc::new(ClockAudioBinder::default()),
            scheduler: Arc::new(IntervalFrameScheduler::from_millis(frame_ms)),
            events,
        };
        (Arc::new(PlaybackSynchronizer::new("test-player", deps)), rx)
    }

    fn drain(rx: &mut broadcast::Receiver<PlaybackEvent>) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_installs_ready_session() {
        let (sync, mut rx) =
            synchronizer(ScriptedSynthesizer::new(vec![Ok(hi_there())], Duration::ZERO));
        assert_eq!(sync.state(), PlaybackState::Idle);

        let table = sync.generate_speech("Hi there", "en", 1.0).await.unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(sync.state(), PlaybackState::Ready);
        assert_eq!(sync.cursor(), None);
        assert_eq!(sync.session_id(), Some(1));
        assert_eq!(sync.total_duration_ms(), 1000.0);
        assert!(sync.last_error().is_none());

        let events = drain(&mut rx);
        assert!(matches!(
            events[0],
            PlaybackEvent::StateChanged {
                from: PlaybackState::Idle,
                to: PlaybackState::Loading,
                ..
            }
        ));
        assert!(matches!(
            events[1],
            PlaybackEvent::StateChanged {
                to: PlaybackState::Ready,
                session_id: Some(1),
                ..
            }
        ));
        assert!(matches!(
            events[2],
            PlaybackEvent::GenerationCompleted {
                session_id: 1,
                total_words: 2,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_operations_without_resource_are_reported() {
        let (sync, _rx) = synchronizer(ScriptedSynthesizer::new(vec![], Duration::ZERO));

        assert_eq!(sync.play(), Err(PlaybackError::NoBoundResource));
        assert_eq!(sync.last_error(), Some(PlaybackError::NoBoundResource));
        assert_eq!(sync.pause(), Err(PlaybackError::NoBoundResource));
        assert_eq!(sync.stop(), Err(PlaybackError::NoBoundResource));
        assert_eq!(sync.seek(100.0), Err(PlaybackError::NoBoundResource));
        assert_eq!(
            sync.set_playback_rate(1.5),
            Err(PlaybackError::NoBoundResource)
        );
        assert_eq!(sync.state(), PlaybackState::Idle);
        assert_eq!(sync.elapsed_ms(), 0.0);
        assert!(sync.timing_table().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_text_rejected_without_transition() {
        let synthesizer = ScriptedSynthesizer::new(vec![Ok(hi_there())], Duration::ZERO);
        let (sync, _rx) = synchronizer(synthesizer.clone());

        let err = sync.generate_speech("   ", "en", 1.0).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_request");
        assert_eq!(sync.state(), PlaybackState::Idle);
        assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cursor_follows_playback_until_ended() {
        let (sync, _rx) =
            synchronizer(ScriptedSynthesizer::new(vec![Ok(hi_there())], Duration::ZERO));
        sync.generate_speech("Hi there", "en", 1.0).await.unwrap();

        sync.play().unwrap();
        assert_eq!(sync.state(), PlaybackState::Playing);

        advance(105).await;
        assert_eq!(sync.cursor(), Some(0));
        assert_eq!(sync.current_word().unwrap().word, "Hi");

        // 间隙 [500, 600)
        advance(450).await;
        assert_eq!(sync.cursor(), None);

        advance(150).await;
        assert_eq!(sync.cursor(), Some(1));

        advance(400).await;
        assert_eq!(sync.state(), PlaybackState::Ended);
        assert_eq!(sync.cursor(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cursor_notifications_are_not_redundant() {
        let (sync, mut rx) =
            synchronizer(ScriptedSynthesizer::new(vec![Ok(hi_there())], Duration::ZERO));
        sync.generate_speech("Hi there", "en", 1.0).await.unwrap();
        drain(&mut rx);

        sync.play().unwrap();
        advance(400).await;

        let cursor_events: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, PlaybackEvent::CursorChanged { .. }))
            .collect();
        assert_eq!(cursor_events.len(), 1);
        assert!(matches!(
            &cursor_events[0],
            PlaybackEvent::CursorChanged { index: Some(0), word: Some(w), .. } if w == "Hi"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_retains_cursor_and_stop_clears_it() {
        let (sync, _rx) =
            synchronizer(ScriptedSynthesizer::new(vec![Ok(hi_there())], Duration::ZERO));
        sync.generate_speech("Hi there", "en", 1.0).await.unwrap();

        sync.play().unwrap();
        advance(705).await;
        sync.pause().unwrap();
        assert_eq!(sync.state(), PlaybackState::Paused);
        assert_eq!(sync.cursor(), Some(1));

        let frozen = sync.elapsed_ms();
        advance(500).await;
        assert_eq!(sync.elapsed_ms(), frozen);
        assert_eq!(sync.cursor(), Some(1));
        assert_eq!(sync.state(), PlaybackState::Paused);

        sync.stop().unwrap();
        assert_eq!(sync.state(), PlaybackState::Ready);
        assert_eq!(sync.cursor(), None);
        assert_eq!(sync.elapsed_ms(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_after_audio_end_reports_ended() {
        let (sync, mut rx) = synchronizer_with_frame(
            ScriptedSynthesizer::new(vec![Ok(hi_there())], Duration::ZERO),
            16,
        );
        sync.generate_speech("Hi there", "en", 1.0).await.unwrap();

        sync.play().unwrap();
        // 资源在 1000ms 结束，下一次采样在 1008ms
        advance(1000).await;
        assert_eq!(sync.state(), PlaybackState::Playing);
        assert_eq!(sync.cursor(), Some(1));
        drain(&mut rx);

        sync.pause().unwrap();
        assert_eq!(sync.state(), PlaybackState::Ended);
        assert_eq!(sync.cursor(), None);
        assert_eq!(sync.elapsed_ms(), 1000.0);

        let events = drain(&mut rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, PlaybackEvent::CursorChanged { index: None, .. })));
        assert!(events.iter().any(|e| matches!(
            e,
            PlaybackEvent::StateChanged {
                from: PlaybackState::Playing,
                to: PlaybackState::Ended,
                ..
            }
        )));

        advance(100).await;
        assert_eq!(sync.state(), PlaybackState::Ended);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_after_pause_continues_from_position() {
        let (sync, _rx) =
            synchronizer(ScriptedSynthesizer::new(vec![Ok(hi_there())], Duration::ZERO));
        sync.generate_speech("Hi there", "en", 1.0).await.unwrap();

        sync.play().unwrap();
        advance(405).await;
        sync.pause().unwrap();
        advance(1000).await;

        sync.play().unwrap();
        advance(250).await;
        assert_eq!(sync.state(), PlaybackState::Playing);
        assert_eq!(sync.cursor(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_resolves_cursor_immediately() {
        let (sync, _rx) =
            synchronizer(ScriptedSynthesizer::new(vec![Ok(hi_there())], Duration::ZERO));
        let table = sync.generate_speech("Hi there", "en", 1.0).await.unwrap();

        for target in [650.0, 550.0, 0.0, 999.0, 1000.0, 250.0] {
            sync.seek(target).unwrap();
            assert_eq!(sync.cursor(), table.lookup(target), "seek to {}", target);
        }
        assert_eq!(sync.state(), PlaybackState::Ready);

        sync.play().unwrap();
        advance(55).await;
        sync.seek(620.0).unwrap();
        assert_eq!(sync.cursor(), Some(1));
        assert_eq!(sync.state(), PlaybackState::Playing);

        let err = sync.seek(f64::NAN).unwrap_err();
        assert_eq!(err.kind(), "invalid_request");
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_after_end_pauses_and_play_restarts() {
        let (sync, _rx) =
            synchronizer(ScriptedSynthesizer::new(vec![Ok(hi_there())], Duration::ZERO));
        sync.generate_speech("Hi there", "en", 1.0).await.unwrap();

        sync.play().unwrap();
        advance(1100).await;
        assert_eq!(sync.state(), PlaybackState::Ended);

        sync.seek(100.0).unwrap();
        assert_eq!(sync.state(), PlaybackState::Paused);
        assert_eq!(sync.cursor(), Some(0));

        sync.seek(1000.0).unwrap();
        sync.play().unwrap();
        advance(55).await;
        assert_eq!(sync.state(), PlaybackState::Playing);
        assert_eq!(sync.cursor(), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_playback_rate_changes_resource_only() {
        let (sync, mut rx) =
            synchronizer(ScriptedSynthesizer::new(vec![Ok(hi_there())], Duration::ZERO));
        let table = sync.generate_speech("Hi there", "en", 1.0).await.unwrap();

        sync.set_playback_rate(2.0).unwrap();
        assert_eq!(sync.playback_rate(), 2.0);
        sync.play().unwrap();
        advance(325).await;

        // 2 倍速下 325ms 墙钟对应约 650ms 媒体时间
        assert_eq!(sync.cursor(), Some(1));
        assert_eq!(sync.timing_table().get(1).unwrap().start_ms, 600.0);
        assert_eq!(*sync.timing_table(), *table);
        assert!(drain(&mut rx)
            .iter()
            .any(|e| matches!(e, PlaybackEvent::RateChanged { rate, .. } if *rate == 2.0)));

        let err = sync.set_playback_rate(0.0).unwrap_err();
        assert_eq!(err.kind(), "invalid_request");
        assert_eq!(sync.playback_rate(), 2.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_table_classified() {
        let synthesizer = ScriptedSynthesizer::new(
            vec![Err(SynthesisError::MalformedTimings(TimingError::Inverted {
                index: 0,
                start_ms: 500.0,
                end_ms: 100.0,
            }))],
            Duration::ZERO,
        );
        let (sync, mut rx) = synchronizer(synthesizer);

        let err = sync.generate_speech("Hi", "en", 1.0).await.unwrap_err();
        assert!(matches!(err, PlaybackError::MalformedTimingTable(_)));
        assert_eq!(sync.state(), PlaybackState::Error);
        assert_eq!(sync.last_error(), Some(err));
        assert_eq!(sync.play(), Err(PlaybackError::NoBoundResource));

        assert!(drain(&mut rx).iter().any(|e| matches!(
            e,
            PlaybackEvent::GenerationFailed { kind, .. } if kind == "malformed_timing_table"
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_failure_is_not_retried() {
        let synthesizer = ScriptedSynthesizer::new(
            vec![
                Err(SynthesisError::NetworkError("connection refused".into())),
                Ok(hi_there()),
            ],
            Duration::ZERO,
        );
        let (sync, _rx) = synchronizer(synthesizer.clone());

        let err = sync.generate_speech("Hi there", "en", 1.0).await.unwrap_err();
        assert!(matches!(err, PlaybackError::RequestFailure(_)));
        assert_eq!(sync.state(), PlaybackState::Error);
        assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 1);

        // 由调用方决定重新生成
        sync.generate_speech("Hi there", "en", 1.0).await.unwrap();
        assert_eq!(sync.state(), PlaybackState::Ready);
        assert!(sync.last_error().is_none());
        assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_generation_rejected() {
        let synthesizer = ScriptedSynthesizer::new(
            vec![Ok(hi_there()), Ok(second_take())],
            Duration::from_millis(300),
        );
        let (sync, _rx) = synchronizer(synthesizer.clone());

        let first = {
            let sync = sync.clone();
            tokio::spawn(async move { sync.generate_speech("Hi there", "en", 1.0).await })
        };
        advance(10).await;
        assert_eq!(sync.state(), PlaybackState::Loading);

        let err = sync.generate_speech("Once more", "en", 1.0).await.unwrap_err();
        assert_eq!(err, PlaybackError::ConcurrentGenerationRejected);
        assert_eq!(sync.state(), PlaybackState::Loading);

        let table = first.await.unwrap().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(sync.state(), PlaybackState::Ready);
        assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_generation_isolates_previous_session() {
        let synthesizer = ScriptedSynthesizer::new(
            vec![Ok(hi_there()), Ok(second_take())],
            Duration::from_millis(200),
        );
        let (sync, mut rx) = synchronizer(synthesizer);

        sync.generate_speech("Hi there", "en", 1.0).await.unwrap();
        sync.play().unwrap();
        advance(105).await;
        assert_eq!(sync.cursor(), Some(0));
        drain(&mut rx);

        let pending = {
            let sync = sync.clone();
            tokio::spawn(async move { sync.generate_speech("Once more please", "en", 1.0).await })
        };
        // 旧会话的循环在 Loading 期间继续调度也不得写入
        advance(150).await;
        assert_eq!(sync.state(), PlaybackState::Loading);
        assert_eq!(sync.cursor(), None);
        assert!(sync.timing_table().is_empty());

        pending.await.unwrap().unwrap();
        assert_eq!(sync.session_id(), Some(2));
        sync.play().unwrap();
        advance(455).await;
        assert_eq!(sync.cursor(), Some(1));

        let events = drain(&mut rx);
        assert!(!events.is_empty());
        for event in &events {
            if let PlaybackEvent::CursorChanged { session_id, .. } = event {
                assert_eq!(*session_id, 2);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_releases_session() {
        let (sync, mut rx) =
            synchronizer(ScriptedSynthesizer::new(vec![Ok(hi_there())], Duration::ZERO));
        sync.generate_speech("Hi there", "en", 1.0).await.unwrap();
        sync.play().unwrap();
        advance(50).await;

        sync.shutdown("closed by client");
        assert_eq!(sync.state(), PlaybackState::Idle);
        assert_eq!(sync.cursor(), None);
        assert_eq!(sync.play(), Err(PlaybackError::NoBoundResource));

        let events = drain(&mut rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, PlaybackEvent::PlayerClosed { .. })));

        // 循环已取消，不再产生光标事件
        advance(100).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_and_highlight_views() {
        let (sync, _rx) =
            synchronizer(ScriptedSynthesizer::new(vec![Ok(hi_there())], Duration::ZERO));
        sync.generate_speech("Hi there", "en", 1.0).await.unwrap();
        sync.seek(700.0).unwrap();

        let snapshot = sync.snapshot();
        assert_eq!(snapshot.state, PlaybackState::Ready);
        assert_eq!(snapshot.cursor, Some(1));
        assert_eq!(snapshot.current_word.as_deref(), Some("there"));
        assert_eq!(snapshot.elapsed_ms, 700.0);
        assert_eq!(snapshot.total_words, 2);
        assert_eq!(
            snapshot.audio_url.as_deref(),
            Some("http://localhost:8000/audio/hi.mp3")
        );

        let words = sync.words_with_status();
        assert!(words[1].is_highlighted);
        assert!(sync
            .highlighted_html()
            .contains("<span class=\"word highlighted\" data-index=\"1\">there</span>"));
    }
}
