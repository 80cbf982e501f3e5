//! Highlight Loop - 播放位置采样循环
//!
//! 每次 `play()` 启动一个循环任务。循环在入口检查取消令牌，
//! 并在与会话替换相同的锁内校验会话编号，旧会话的循环不会写入新会话。

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use super::session::SyncState;
use crate::application::ports::FrameSchedulerPort;
use crate::domain::playback::PlaybackState;
use crate::infrastructure::events::EventPublisher;

/// 循环启动时捕获的上下文
pub(crate) struct LoopContext {
    pub player_id: String,
    pub session_id: u64,
    pub shared: Arc<Mutex<SyncState>>,
    pub scheduler: Arc<dyn FrameSchedulerPort>,
    pub events: Arc<EventPublisher>,
    pub token: CancellationToken,
}

enum Tick {
    Continue,
    Stop,
}

pub(crate) async fn run_highlight_loop(ctx: LoopContext) {
    tracing::debug!(
        player_id = %ctx.player_id,
        session_id = ctx.session_id,
        "Highlight loop started"
    );

    let mut samples: u64 = 0;
    loop {
        if ctx.token.is_cancelled() {
            break;
        }
        samples += 1;
        if let Tick::Stop = sample(&ctx) {
            break;
        }

        tokio::select! {
            biased;
            _ = ctx.token.cancelled() => break,
            _ = ctx.scheduler.next_frame() => {}
        }
    }

    tracing::debug!(
        player_id = %ctx.player_id,
        session_id = ctx.session_id,
        samples = samples,
        "Highlight loop stopped"
    );
}

/// 单次采样
fn sample(ctx: &LoopContext) -> Tick {
    let mut guard = ctx.shared.lock();
    let shared = &mut *guard;

    // 会话守卫：必须仍是启动时的会话且处于播放中
    let Some(session) = shared.session.as_mut() else {
        return Tick::Stop;
    };
    if session.id != ctx.session_id
        || shared.state != PlaybackState::Playing
        || ctx.token.is_cancelled()
    {
        return Tick::Stop;
    }

    if session.resource.is_ended() {
        shared.mark_ended(&ctx.events, &ctx.player_id);
        tracing::info!(
            player_id = %ctx.player_id,
            session_id = ctx.session_id,
            "Playback ended"
        );
        return Tick::Stop;
    }

    // 资源被外部暂停（如系统音频中断）
    if session.resource.is_paused() {
        session.cancel_loop();
        shared.transition(PlaybackState::Paused, &ctx.events, &ctx.player_id);
        tracing::info!(
            player_id = %ctx.player_id,
            session_id = ctx.session_id,
            "Audio resource paused externally"
        );
        return Tick::Stop;
    }

    let position_ms = session.resource.position_ms();
    let index = session.timings.lookup(position_ms);
    if session.move_cursor(index) {
        tracing::trace!(
            player_id = %ctx.player_id,
            session_id = ctx.session_id,
            index = ?index,
            position_ms = position_ms,
            "Cursor moved"
        );
        shared.publish_cursor(&ctx.events, &ctx.player_id);
    }

    Tick::Continue
}
