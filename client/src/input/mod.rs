//! 入力モジュール
//!
//! タッチ入力を処理し、モードに応じたプロトコルイベントに変換します。
//! 自由タッチモードでは `TouchTracker`、OSUモードでは `ZoneKeyTracker` を使用します。

mod keys;
mod tracker;
mod zones;

pub use keys::ZoneKeyTracker;
pub use tracker::TouchTracker;
pub use zones::{Zone, ZoneHitTest, ZoneLayout};

use serde::{Deserialize, Serialize};
use touch_relay_common::TouchId;

/// タッチイベントの段階
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchPhase {
    /// 接触開始
    Start,
    /// 移動
    Move,
    /// 接触終了
    End,
    /// キャンセル（システムジェスチャーなど）
    Cancel,
}

/// 変化したタッチ1点分
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    /// タッチ識別子
    pub id: TouchId,
    /// 画面上のX座標
    #[serde(alias = "x")]
    pub client_x: f64,
    /// 画面上のY座標
    #[serde(alias = "y")]
    pub client_y: f64,
}

impl TouchPoint {
    pub fn new(id: TouchId, client_x: f64, client_y: f64) -> Self {
        Self { id, client_x, client_y }
    }
}

/// キャプチャ面やゾーンの矩形（画面座標）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl SurfaceRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// 原点から始まる矩形
    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// 画面座標を矩形に対する比率に変換
    ///
    /// 矩形の大きさが0、または座標が有限でない場合は `None` を返します。
    /// 矩形の外側の点は0.0-1.0の範囲外の値になります。
    pub fn normalize(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return None;
        }
        let nx = (x - self.left) / self.width;
        let ny = (y - self.top) / self.height;
        if nx.is_finite() && ny.is_finite() {
            Some((nx, ny))
        } else {
            None
        }
    }

    /// 点が矩形内にあるかどうか（右端と下端を含む）
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left
            && x <= self.left + self.width
            && y >= self.top
            && y <= self.top + self.height
    }

    /// 比率で指定した部分矩形を取得
    pub fn sub_rect(&self, x: f64, y: f64, width: f64, height: f64) -> SurfaceRect {
        SurfaceRect::new(
            self.left + x * self.width,
            self.top + y * self.height,
            width * self.width,
            height * self.height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        let rect = SurfaceRect::new(10.0, 20.0, 200.0, 100.0);
        assert_eq!(rect.normalize(110.0, 70.0), Some((0.5, 0.5)));
        assert_eq!(rect.normalize(10.0, 20.0), Some((0.0, 0.0)));
    }

    #[test]
    fn test_normalize_rejects_degenerate() {
        assert_eq!(SurfaceRect::from_size(0.0, 100.0).normalize(1.0, 1.0), None);
        assert_eq!(SurfaceRect::from_size(100.0, 100.0).normalize(f64::NAN, 1.0), None);
        assert_eq!(SurfaceRect::from_size(100.0, 100.0).normalize(1.0, f64::INFINITY), None);
    }

    #[test]
    fn test_contains_and_sub_rect() {
        let rect = SurfaceRect::from_size(400.0, 200.0);
        let right_half = rect.sub_rect(0.5, 0.0, 0.5, 1.0);
        assert_eq!(right_half, SurfaceRect::new(200.0, 0.0, 200.0, 200.0));
        assert!(right_half.contains(200.0, 100.0));
        assert!(right_half.contains(400.0, 200.0));
        assert!(!right_half.contains(199.9, 100.0));
        assert!(!right_half.contains(f64::NAN, 100.0));
    }

    #[test]
    fn test_touch_point_accepts_short_names() {
        let point: TouchPoint = serde_json::from_str(r#"{"id":4,"x":1.5,"y":2.0}"#).unwrap();
        assert_eq!(point, TouchPoint::new(4, 1.5, 2.0));
    }
}
