//! タッチフィードバック
//!
//! エミュレータから届く `touch_feedback` を、一定時間だけ表示するマーカーに変換します。

use touch_relay_common::{GameMode, TouchFeedbackData, TouchId, TouchSide};

/// マーカーの見た目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStyle {
    /// 左レーン
    Left,
    /// 右レーン
    Right,
    /// 共通配色
    Uniform,
}

impl MarkerStyle {
    /// CSSクラス名
    pub fn css_class(&self) -> &'static str {
        match self {
            MarkerStyle::Left => "left-side",
            MarkerStyle::Right => "right-side",
            MarkerStyle::Uniform => "uniform",
        }
    }
}

/// フィードバックマーカー
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackMarker {
    pub id: TouchId,
    pub x_percent: f64,
    pub y_percent: f64,
    pub style: MarkerStyle,
    /// 消える時刻（UNIXミリ秒）
    pub expires_at: u64,
}

/// フィードバック表示層
#[derive(Debug, Clone)]
pub struct FeedbackLayer {
    markers: Vec<FeedbackMarker>,
    lifetime_ms: u64,
}

impl FeedbackLayer {
    pub fn new(lifetime_ms: u64) -> Self {
        Self {
            markers: Vec::new(),
            lifetime_ms,
        }
    }

    /// 表示中のマーカー
    pub fn markers(&self) -> &[FeedbackMarker] {
        &self.markers
    }

    /// フィードバックを追加
    pub fn push(
        &mut self,
        data: &TouchFeedbackData,
        mode: GameMode,
        now_ms: u64,
    ) -> &FeedbackMarker {
        let style = match mode {
            GameMode::Musedash if data.side == Some(TouchSide::Left) => MarkerStyle::Left,
            GameMode::Musedash => MarkerStyle::Right,
            _ => MarkerStyle::Uniform,
        };

        self.markers.push(FeedbackMarker {
            id: data.id,
            x_percent: data.x_percent,
            y_percent: data.y_percent,
            style,
            expires_at: now_ms.saturating_add(self.lifetime_ms),
        });
        &self.markers[self.markers.len() - 1]
    }

    /// 期限切れのマーカーを削除し、削除した数を返す
    pub fn expire(&mut self, now_ms: u64) -> usize {
        let before = self.markers.len();
        self.markers.retain(|m| m.expires_at > now_ms);
        before - self.markers.len()
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }
}
