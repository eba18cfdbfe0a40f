//! 自由タッチモードのトラッカー
//!
//! 変化したタッチごとに `touch_event` を生成します。
//! 移動は送信せず、down/up/cancel の3種類だけを送ります。

use super::{SurfaceRect, TouchPhase, TouchPoint};
use touch_relay_common::{OutboundEvent, TouchEventData, TouchEventType};

/// 自由タッチモードのトラッカー
///
/// タッチ間の状態は持ちません。
#[derive(Debug, Clone, Copy, Default)]
pub struct TouchTracker;

impl TouchTracker {
    pub fn new() -> Self {
        Self
    }

    /// 段階に対応するイベント種類
    fn event_type(phase: TouchPhase) -> Option<TouchEventType> {
        match phase {
            TouchPhase::Start => Some(TouchEventType::Down),
            TouchPhase::End => Some(TouchEventType::Up),
            TouchPhase::Cancel => Some(TouchEventType::Cancel),
            TouchPhase::Move => None,
        }
    }

    /// タッチイベントを処理
    ///
    /// 座標はイベント時点の `surface` に対して正規化されます。
    pub fn handle(
        &self,
        phase: TouchPhase,
        touches: &[TouchPoint],
        surface: &SurfaceRect,
        now_ms: u64,
    ) -> Vec<OutboundEvent> {
        let Some(kind) = Self::event_type(phase) else {
            return Vec::new();
        };

        touches
            .iter()
            .filter_map(|touch| {
                let normalized = surface.normalize(touch.client_x, touch.client_y);
                let Some((x_percent, y_percent)) = normalized else {
                    log::debug!("座標を正規化できないタッチを無視します: {:?}", touch);
                    return None;
                };
                Some(OutboundEvent::TouchEvent(TouchEventData {
                    kind,
                    id: touch.id,
                    ts: now_ms,
                    x_percent,
                    y_percent,
                }))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(event: &OutboundEvent) -> &TouchEventData {
        match event {
            OutboundEvent::TouchEvent(data) => data,
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_down_then_cancel() {
        let tracker = TouchTracker::new();
        let surface = SurfaceRect::from_size(800.0, 600.0);
        let touch = [TouchPoint::new(7, 400.0, 300.0)];

        let down = tracker.handle(TouchPhase::Start, &touch, &surface, 1000);
        assert_eq!(down.len(), 1);
        let d = data(&down[0]);
        assert_eq!(d.kind, TouchEventType::Down);
        assert_eq!(d.id, 7);
        assert_eq!(d.ts, 1000);
        assert_eq!((d.x_percent, d.y_percent), (0.5, 0.5));

        let cancel = tracker.handle(TouchPhase::Cancel, &touch, &surface, 1020);
        assert_eq!(data(&cancel[0]).kind, TouchEventType::Cancel);
        assert_eq!(data(&cancel[0]).id, 7);
    }

    #[test]
    fn test_move_emits_nothing() {
        let tracker = TouchTracker::new();
        let surface = SurfaceRect::from_size(800.0, 600.0);
        let touch = [TouchPoint::new(1, 10.0, 10.0)];
        let events = tracker.handle(TouchPhase::Move, &touch, &surface, 0);
        assert!(events.is_empty());
    }

    #[test]
    fn test_empty_change_list() {
        let tracker = TouchTracker::new();
        let surface = SurfaceRect::from_size(800.0, 600.0);
        assert!(tracker.handle(TouchPhase::Start, &[], &surface, 0).is_empty());
    }

    #[test]
    fn test_surface_read_per_event() {
        let tracker = TouchTracker::new();
        let touch = [TouchPoint::new(2, 100.0, 100.0)];

        let small = SurfaceRect::from_size(200.0, 200.0);
        let large = SurfaceRect::from_size(400.0, 400.0);
        let before = tracker.handle(TouchPhase::Start, &touch, &small, 0);
        let after = tracker.handle(TouchPhase::End, &touch, &large, 5);

        assert_eq!(data(&before[0]).x_percent, 0.5);
        assert_eq!(data(&after[0]).x_percent, 0.25);
        assert_eq!(data(&after[0]).kind, TouchEventType::Up);
    }

    #[test]
    fn test_multiple_touches_and_degenerate_surface() {
        let tracker = TouchTracker::new();
        let touches = [TouchPoint::new(1, 0.0, 0.0), TouchPoint::new(2, 50.0, 50.0)];

        let surface = SurfaceRect::from_size(100.0, 100.0);
        let events = tracker.handle(TouchPhase::Start, &touches, &surface, 0);
        let ids: Vec<_> = events.iter().map(|e| data(e).id).collect();
        assert_eq!(ids, vec![1, 2]);

        let empty = SurfaceRect::from_size(0.0, 0.0);
        let none = tracker.handle(TouchPhase::Start, &touches, &empty, 0);
        assert!(none.is_empty());
    }
}
