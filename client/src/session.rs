//! クライアントセッション
//!
//! 1つの接続につき1つ作成され、モード、両トラッカー、表示モデルを所有します。
//! すべてのハンドラは単一スレッド上で最後まで実行されるため、ロックは不要です。

use crate::input::{SurfaceRect, TouchPhase, TouchPoint, TouchTracker, ZoneHitTest, ZoneKeyTracker};
use crate::network::EventChannel;
use crate::ui::{FeedbackLayer, StatusLine};
use touch_relay_common::config::DisplayConfig;
use touch_relay_common::{GameMode, InboundEvent, OutboundEvent, SystemKey};

/// クライアントセッション
pub struct Session<C: EventChannel> {
    /// 送信チャネル
    channel: C,
    /// 現在のモード
    mode: GameMode,
    /// 自由タッチモードのトラッカー
    touch_tracker: TouchTracker,
    /// OSUモードのトラッカー
    key_tracker: ZoneKeyTracker,
    /// ステータス行
    status: StatusLine,
    /// タッチフィードバック
    feedback: FeedbackLayer,
    /// 送信に失敗して破棄したイベント数
    dropped: u64,
}

impl<C: EventChannel> Session<C> {
    /// 新しいセッションを作成
    pub fn new(channel: C, mode: GameMode, display: &DisplayConfig) -> Self {
        Self {
            channel,
            mode,
            touch_tracker: TouchTracker::new(),
            key_tracker: ZoneKeyTracker::new(),
            status: StatusLine::new(display.error_revert_ms),
            feedback: FeedbackLayer::new(display.feedback_lifetime_ms),
            dropped: 0,
        }
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn key_tracker(&self) -> &ZoneKeyTracker {
        &self.key_tracker
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn feedback(&self) -> &FeedbackLayer {
        &self.feedback
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// 送信に失敗して破棄したイベント数
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// タッチイベントを処理
    ///
    /// OSUモードではゾーンキートラッカー、それ以外では自由タッチトラッカーに渡します。
    pub fn on_touch<Z: ZoneHitTest + ?Sized>(
        &mut self,
        phase: TouchPhase,
        touches: &[TouchPoint],
        surface: &SurfaceRect,
        zones: &Z,
        now_ms: u64,
    ) {
        let events = if self.mode.uses_zone_keys() {
            self.key_tracker.handle(phase, touches, zones)
        } else {
            self.touch_tracker.handle(phase, touches, surface, now_ms)
        };
        self.send_all(events);
    }

    /// 受信イベントを処理
    pub fn on_inbound(&mut self, event: InboundEvent, now_ms: u64) {
        match event {
            InboundEvent::Connect => {
                log::info!("エミュレータに接続しました");
                self.status.connected();
            }
            InboundEvent::Disconnect => {
                log::info!("エミュレータとの接続が切断されました");
                self.status.disconnected();
            }
            InboundEvent::Status { message } => self.status.status(&message),
            InboundEvent::Error { message } => {
                log::warn!("エミュレータからのエラー: {}", message);
                self.status.error(&message, now_ms);
            }
            InboundEvent::ModeUpdate { mode } => {
                self.transition(mode);
                self.status.mode(mode);
            }
            InboundEvent::TouchFeedback(data) => {
                self.feedback.push(&data, self.mode, now_ms);
            }
        }
    }

    /// ローカルのモード選択
    ///
    /// キーを解放してからモード変更要求を送ります。
    pub fn select_mode(&mut self, mode: GameMode) {
        self.transition(mode);
        self.send(OutboundEvent::SetMode { mode });
    }

    /// UIボタンの押下
    pub fn press_key(&mut self, key: SystemKey) {
        self.send(OutboundEvent::KeyPress { key });
    }

    /// 時間経過の処理（エラー表示の復帰とフィードバックの期限切れ）
    pub fn tick(&mut self, now_ms: u64) {
        self.status.tick(now_ms, self.mode);
        self.feedback.expire(now_ms);
    }

    /// セッション終了
    ///
    /// エミュレータ側にキーが押されたまま残らないよう、押下中のキーをすべて解放します。
    pub fn shutdown(&mut self) {
        let released = self.key_tracker.release_all();
        self.send_all(released);
        self.feedback.clear();
    }

    /// モード遷移
    ///
    /// OSUモードに留まる場合以外は、新しいモードを採用する前にすべてのキーを解放します。
    fn transition(&mut self, mode: GameMode) {
        let previous = self.mode;
        if previous.uses_zone_keys() && mode.uses_zone_keys() {
            return;
        }

        let released = self.key_tracker.release_all();
        self.send_all(released);
        self.mode = mode;

        if previous != mode {
            log::info!("モードを切り替えました: {} -> {}", previous, mode);
        }
    }

    fn send_all(&mut self, events: Vec<OutboundEvent>) {
        for event in events {
            self.send(event);
        }
    }

    fn send(&mut self, event: OutboundEvent) {
        if let Err(e) = self.channel.emit(&event) {
            self.dropped += 1;
            log::debug!("イベント {} を破棄しました: {}", event.name(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ZoneLayout;
    use crate::network::NetworkError;
    use crate::ui::{MarkerStyle, StatusTone};
    use touch_relay_common::{OsuKey, TouchEventData, TouchEventType, TouchFeedbackData, TouchSide};

    /// 送信イベントを記録するチャネル
    #[derive(Default)]
    struct MemoryChannel {
        sent: Vec<OutboundEvent>,
        closed: bool,
    }

    impl EventChannel for MemoryChannel {
        fn emit(&mut self, event: &OutboundEvent) -> Result<(), NetworkError> {
            if self.closed {
                return Err(NetworkError::NotConnected);
            }
            self.sent.push(event.clone());
            Ok(())
        }

        fn is_connected(&self) -> bool {
            !self.closed
        }
    }

    const SURFACE: SurfaceRect = SurfaceRect {
        left: 0.0,
        top: 0.0,
        width: 400.0,
        height: 100.0,
    };

    fn session(mode: GameMode) -> Session<MemoryChannel> {
        Session::new(MemoryChannel::default(), mode, &DisplayConfig::default())
    }

    fn zones() -> ZoneLayout {
        ZoneLayout::columns(&SURFACE)
    }

    fn at(key: OsuKey, id: i32) -> TouchPoint {
        TouchPoint::new(id, key.index() as f64 * 100.0 + 50.0, 50.0)
    }

    fn touch(s: &mut Session<MemoryChannel>, phase: TouchPhase, points: &[TouchPoint]) {
        s.on_touch(phase, points, &SURFACE, &zones(), 1_000);
    }

    fn take(s: &mut Session<MemoryChannel>) -> Vec<OutboundEvent> {
        std::mem::take(&mut s.channel_mut().sent)
    }

    #[test]
    fn test_osu_scenario_second_touch_ignored() {
        let mut s = session(GameMode::Osu);

        touch(&mut s, TouchPhase::Start, &[at(OsuKey::D, 1)]);
        assert_eq!(take(&mut s), vec![OutboundEvent::OsuKeyDown { key: OsuKey::D }]);

        touch(&mut s, TouchPhase::Start, &[at(OsuKey::D, 2)]);
        assert!(take(&mut s).is_empty());

        touch(&mut s, TouchPhase::End, &[at(OsuKey::D, 1)]);
        assert_eq!(take(&mut s), vec![OutboundEvent::OsuKeyUp { key: OsuKey::D }]);

        touch(&mut s, TouchPhase::End, &[at(OsuKey::D, 2)]);
        assert!(take(&mut s).is_empty());
    }

    #[test]
    fn test_mode_update_releases_pressed_keys_first() {
        let mut s = session(GameMode::Osu);
        touch(&mut s, TouchPhase::Start, &[at(OsuKey::D, 1), at(OsuKey::F, 2)]);
        take(&mut s);

        s.on_inbound(InboundEvent::ModeUpdate { mode: GameMode::Rizline }, 2_000);
        assert_eq!(
            take(&mut s),
            vec![
                OutboundEvent::OsuKeyUp { key: OsuKey::D },
                OutboundEvent::OsuKeyUp { key: OsuKey::F },
            ]
        );
        assert_eq!(s.mode(), GameMode::Rizline);
        assert!(s.key_tracker().pressed_keys().is_empty());
        assert_eq!(s.status().current().text, "モード: rizline");

        // 自由タッチトラッカーはタッチ間の状態を持たないので、osu モード中に
        // 着地したタッチの終了も touch_event の up として送られる。キーは二重に解放しない
        touch(&mut s, TouchPhase::End, &[at(OsuKey::D, 1)]);
        assert_eq!(
            take(&mut s),
            vec![OutboundEvent::TouchEvent(TouchEventData {
                kind: TouchEventType::Up,
                id: 1,
                ts: 1_000,
                x_percent: 0.125,
                y_percent: 0.5,
            })]
        );
    }

    #[test]
    fn test_osu_rebroadcast_keeps_held_keys() {
        let mut s = session(GameMode::Osu);
        touch(&mut s, TouchPhase::Start, &[at(OsuKey::K, 5)]);
        take(&mut s);

        s.on_inbound(InboundEvent::ModeUpdate { mode: GameMode::Osu }, 0);
        assert!(take(&mut s).is_empty());
        assert!(s.key_tracker().is_pressed(OsuKey::K));
    }

    #[test]
    fn test_local_select_releases_before_set_mode() {
        let mut s = session(GameMode::Osu);
        touch(&mut s, TouchPhase::Start, &[at(OsuKey::J, 3)]);
        take(&mut s);

        s.select_mode(GameMode::Musedash);
        assert_eq!(
            take(&mut s),
            vec![
                OutboundEvent::OsuKeyUp { key: OsuKey::J },
                OutboundEvent::SetMode { mode: GameMode::Musedash },
            ]
        );
        assert_eq!(s.mode(), GameMode::Musedash);

        // 権威的な通知が後から届いても二重に解放しない
        s.on_inbound(InboundEvent::ModeUpdate { mode: GameMode::Musedash }, 0);
        assert!(take(&mut s).is_empty());
    }

    #[test]
    fn test_free_form_touch_events() {
        let mut s = session(GameMode::Rizline);
        let point = [TouchPoint::new(7, 200.0, 50.0)];

        s.on_touch(TouchPhase::Start, &point, &SURFACE, &zones(), 42);
        s.on_touch(TouchPhase::Move, &point, &SURFACE, &zones(), 43);
        s.on_touch(TouchPhase::Cancel, &point, &SURFACE, &zones(), 44);

        assert_eq!(
            take(&mut s),
            vec![
                OutboundEvent::TouchEvent(TouchEventData {
                    kind: TouchEventType::Down,
                    id: 7,
                    ts: 42,
                    x_percent: 0.5,
                    y_percent: 0.5,
                }),
                OutboundEvent::TouchEvent(TouchEventData {
                    kind: TouchEventType::Cancel,
                    id: 7,
                    ts: 44,
                    x_percent: 0.5,
                    y_percent: 0.5,
                }),
            ]
        );
    }

    #[test]
    fn test_closed_channel_drops_silently() {
        let mut s = session(GameMode::Osu);
        s.channel_mut().closed = true;

        touch(&mut s, TouchPhase::Start, &[at(OsuKey::D, 1)]);
        s.press_key(SystemKey::Esc);
        assert_eq!(s.dropped(), 2);
        // 送信に失敗してもキーの状態は保持される
        assert!(s.key_tracker().is_pressed(OsuKey::D));

        s.channel_mut().closed = false;
        touch(&mut s, TouchPhase::End, &[at(OsuKey::D, 1)]);
        assert_eq!(take(&mut s), vec![OutboundEvent::OsuKeyUp { key: OsuKey::D }]);
    }

    #[test]
    fn test_status_and_feedback() {
        let mut s = session(GameMode::Musedash);

        s.on_inbound(InboundEvent::Connect, 0);
        assert_eq!(s.status().current().tone, StatusTone::Success);

        let message = "該当モードのキーが満杯です".to_string();
        s.on_inbound(InboundEvent::Error { message }, 1_000);
        assert_eq!(s.status().current().tone, StatusTone::Warning);

        s.on_inbound(
            InboundEvent::TouchFeedback(TouchFeedbackData {
                id: 1,
                key: Some("j".to_string()),
                side: Some(TouchSide::Right),
                x_percent: 0.7,
                y_percent: 0.4,
            }),
            1_000,
        );
        assert_eq!(s.feedback().markers()[0].style, MarkerStyle::Right);
        // フィードバックはトラッカーに影響しない
        assert!(take(&mut s).is_empty());

        s.tick(3_000);
        assert_eq!(s.status().current().text, "モード: musedash");
        assert!(s.feedback().markers().is_empty());

        s.on_inbound(InboundEvent::Disconnect, 3_000);
        assert_eq!(s.status().current().tone, StatusTone::Danger);
    }

    #[test]
    fn test_shutdown_releases_keys() {
        let mut s = session(GameMode::Osu);
        touch(&mut s, TouchPhase::Start, &[at(OsuKey::K, 1), at(OsuKey::D, 2)]);
        take(&mut s);

        s.shutdown();
        assert_eq!(
            take(&mut s),
            vec![
                OutboundEvent::OsuKeyUp { key: OsuKey::D },
                OutboundEvent::OsuKeyUp { key: OsuKey::K },
            ]
        );
        s.shutdown();
        assert!(take(&mut s).is_empty());
    }

    #[test]
    fn test_rapid_mode_flapping() {
        let mut s = session(GameMode::Osu);
        for (i, mode) in [GameMode::Rizline, GameMode::Osu, GameMode::Musedash, GameMode::Osu]
            .into_iter()
            .enumerate()
        {
            if s.mode() == GameMode::Osu {
                touch(&mut s, TouchPhase::Start, &[at(OsuKey::F, i as i32)]);
            }
            s.on_inbound(InboundEvent::ModeUpdate { mode }, 0);
        }

        let events = take(&mut s);
        let downs = events.iter().filter(|e| matches!(e, OutboundEvent::OsuKeyDown { .. })).count();
        let ups = events.iter().filter(|e| matches!(e, OutboundEvent::OsuKeyUp { .. })).count();
        assert_eq!(downs, 2);
        assert_eq!(ups, 2);
        assert_eq!(s.mode(), GameMode::Osu);
    }
}
