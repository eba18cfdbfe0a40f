//! OSUモードのゾーンキートラッカー
//!
//! 複数の物理タッチを、4つの論理キーそれぞれにつき1組の押下/解放へ変換します。
//! 各キーは最初に着地したタッチだけが所有し、そのタッチの終了・キャンセル、
//! またはモード変更でのみ解放されます。

use super::{TouchPhase, TouchPoint, ZoneHitTest};
use touch_relay_common::{OsuKey, OutboundEvent, TouchId};

/// キー1つ分の状態
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct KeySlot {
    /// 所有しているタッチ
    owner: Option<TouchId>,
    /// 押下中かどうか
    pressed: bool,
}

/// ゾーンキートラッカー
///
/// `OsuKey::index()` で引く固定長のテーブルを持ちます。
#[derive(Debug, Clone, Default)]
pub struct ZoneKeyTracker {
    slots: [KeySlot; 4],
}

impl ZoneKeyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// キーが押下中かどうか
    pub fn is_pressed(&self, key: OsuKey) -> bool {
        self.slots[key.index()].pressed
    }

    /// キーを所有しているタッチ
    pub fn owner(&self, key: OsuKey) -> Option<TouchId> {
        self.slots[key.index()].owner
    }

    /// 押下中のキー一覧
    pub fn pressed_keys(&self) -> Vec<OsuKey> {
        OsuKey::ALL.iter().copied().filter(|k| self.is_pressed(*k)).collect()
    }

    /// タッチ開始
    ///
    /// 接触位置のゾーンを解決し、空いていれば `osu_key_down` を返します。
    pub fn touch_start<Z: ZoneHitTest + ?Sized>(
        &mut self,
        touch: &TouchPoint,
        zones: &Z,
    ) -> Option<OutboundEvent> {
        let Some(key) = zones.key_at(touch.client_x, touch.client_y) else {
            log::debug!("ゾーン外のタッチを無視します: id={}", touch.id);
            return None;
        };

        let slot = &mut self.slots[key.index()];
        if slot.pressed {
            log::debug!("キー {} は既にタッチ {:?} が押下中です: id={}", key, slot.owner, touch.id);
            return None;
        }

        slot.owner = Some(touch.id);
        slot.pressed = true;
        log::debug!("キー {} を押下: id={}", key, touch.id);
        Some(OutboundEvent::OsuKeyDown { key })
    }

    /// タッチ終了またはキャンセル
    ///
    /// タッチがキーを所有していれば解放して `osu_key_up` を返します。
    pub fn touch_end(&mut self, id: TouchId) -> Option<OutboundEvent> {
        let key = OsuKey::ALL
            .iter()
            .copied()
            .find(|key| self.slots[key.index()].owner == Some(id))?;

        self.slots[key.index()] = KeySlot::default();
        log::debug!("キー {} を解放: id={}", key, id);
        Some(OutboundEvent::OsuKeyUp { key })
    }

    /// 変化したタッチの一覧を処理
    pub fn handle<Z: ZoneHitTest + ?Sized>(
        &mut self,
        phase: TouchPhase,
        touches: &[TouchPoint],
        zones: &Z,
    ) -> Vec<OutboundEvent> {
        match phase {
            TouchPhase::Start => touches
                .iter()
                .filter_map(|t| self.touch_start(t, zones))
                .collect(),
            TouchPhase::End | TouchPhase::Cancel => touches
                .iter()
                .filter_map(|t| self.touch_end(t.id))
                .collect(),
            // 所有キーは着地時に確定する
            TouchPhase::Move => Vec::new(),
        }
    }

    /// すべてのキーを解放
    ///
    /// 押下中だったキーごとに `osu_key_up` を返します。
    pub fn release_all(&mut self) -> Vec<OutboundEvent> {
        let mut events = Vec::new();
        for key in OsuKey::ALL {
            let slot = &mut self.slots[key.index()];
            if slot.pressed {
                events.push(OutboundEvent::OsuKeyUp { key });
            }
            *slot = KeySlot::default();
        }
        if !events.is_empty() {
            log::info!("{} 個のキーを解放しました", events.len());
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{SurfaceRect, ZoneLayout};

    // 400x100 の面を4等分: d=[0,100] f=(100,200] j=(200,300] k=(300,400]
    fn layout() -> ZoneLayout {
        ZoneLayout::columns(&SurfaceRect::from_size(400.0, 100.0))
    }

    fn at(key: OsuKey, id: TouchId) -> TouchPoint {
        TouchPoint::new(id, key.index() as f64 * 100.0 + 50.0, 50.0)
    }

    fn down(key: OsuKey) -> OutboundEvent {
        OutboundEvent::OsuKeyDown { key }
    }

    fn up(key: OsuKey) -> OutboundEvent {
        OutboundEvent::OsuKeyUp { key }
    }

    #[test]
    fn test_second_touch_on_pressed_zone() {
        let zones = layout();
        let mut tracker = ZoneKeyTracker::new();

        assert_eq!(tracker.touch_start(&at(OsuKey::D, 1), &zones), Some(down(OsuKey::D)));
        assert_eq!(tracker.touch_start(&at(OsuKey::D, 2), &zones), None);
        assert_eq!(tracker.owner(OsuKey::D), Some(1));

        assert_eq!(tracker.touch_end(1), Some(up(OsuKey::D)));
        assert_eq!(tracker.touch_end(2), None);
        assert!(!tracker.is_pressed(OsuKey::D));
    }

    #[test]
    fn test_touch_outside_zones() {
        let zones = layout();
        let mut tracker = ZoneKeyTracker::new();

        assert_eq!(tracker.touch_start(&TouchPoint::new(3, 500.0, 50.0), &zones), None);
        assert_eq!(tracker.touch_end(3), None);
        assert!(tracker.pressed_keys().is_empty());
    }

    #[test]
    fn test_double_end_is_idempotent() {
        let zones = layout();
        let mut tracker = ZoneKeyTracker::new();

        tracker.touch_start(&at(OsuKey::J, 9), &zones);
        assert_eq!(tracker.touch_end(9), Some(up(OsuKey::J)));
        assert_eq!(tracker.touch_end(9), None);
    }

    #[test]
    fn test_key_fixed_at_press_time() {
        let zones = layout();
        let mut tracker = ZoneKeyTracker::new();

        let start = at(OsuKey::F, 4);
        assert_eq!(tracker.handle(TouchPhase::Start, &[start], &zones), vec![down(OsuKey::F)]);

        // K のゾーンまで移動しても F のまま
        let moved = at(OsuKey::K, 4);
        assert!(tracker.handle(TouchPhase::Move, &[moved], &zones).is_empty());
        assert_eq!(tracker.handle(TouchPhase::Cancel, &[moved], &zones), vec![up(OsuKey::F)]);
        assert!(!tracker.is_pressed(OsuKey::K));
    }

    #[test]
    fn test_multi_touch_batch() {
        let zones = layout();
        let mut tracker = ZoneKeyTracker::new();

        let batch = [at(OsuKey::D, 1), at(OsuKey::K, 2), at(OsuKey::D, 3)];
        let events = tracker.handle(TouchPhase::Start, &batch, &zones);
        assert_eq!(events, vec![down(OsuKey::D), down(OsuKey::K)]);

        let events = tracker.handle(TouchPhase::End, &batch, &zones);
        assert_eq!(events, vec![up(OsuKey::D), up(OsuKey::K)]);
    }

    #[test]
    fn test_release_all() {
        let zones = layout();
        let mut tracker = ZoneKeyTracker::new();

        tracker.touch_start(&at(OsuKey::D, 1), &zones);
        tracker.touch_start(&at(OsuKey::F, 2), &zones);
        tracker.touch_start(&at(OsuKey::K, 3), &zones);

        let events = tracker.release_all();
        assert_eq!(events, vec![up(OsuKey::D), up(OsuKey::F), up(OsuKey::K)]);
        assert!(tracker.pressed_keys().is_empty());
        assert_eq!(tracker.owner(OsuKey::K), None);

        // 解放済みのタッチの終了は何も出さない
        assert_eq!(tracker.touch_end(3), None);
        assert!(tracker.release_all().is_empty());
    }

    #[test]
    fn test_press_release_balance() {
        let zones = layout();
        let mut tracker = ZoneKeyTracker::new();
        let mut downs = 0;
        let mut ups = 0;
        let mut count = |events: Vec<OutboundEvent>| {
            for e in events {
                match e {
                    OutboundEvent::OsuKeyDown { .. } => downs += 1,
                    OutboundEvent::OsuKeyUp { .. } => ups += 1,
                    _ => {}
                }
            }
        };

        // 同じゾーンへの重なった着地と順不同の離脱
        let script: [(TouchPhase, TouchId); 10] = [
            (TouchPhase::Start, 1),
            (TouchPhase::Start, 2),
            (TouchPhase::End, 1),
            (TouchPhase::Start, 3),
            (TouchPhase::Cancel, 2),
            (TouchPhase::Start, 4),
            (TouchPhase::End, 3),
            (TouchPhase::End, 3),
            (TouchPhase::Start, 5),
            (TouchPhase::End, 4),
        ];
        for (phase, id) in script {
            count(tracker.handle(phase, &[at(OsuKey::D, id)], &zones));
        }
        count(tracker.handle(TouchPhase::End, &[at(OsuKey::D, 5)], &zones));

        assert_eq!(downs, ups);
        assert!(!tracker.is_pressed(OsuKey::D));
    }
}
