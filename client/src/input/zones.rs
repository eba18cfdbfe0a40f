//! OSUゾーンのヒットテスト
//!
//! 画面座標から、その位置にあるゾーンの論理キーを求めます。

use super::SurfaceRect;
use touch_relay_common::config::ZoneConfig;
use touch_relay_common::OsuKey;

/// 画面座標からゾーンのキーを解決するトレイト
///
/// ブラウザでは `elementFromPoint` を、ネイティブでは `ZoneLayout` を使用します。
pub trait ZoneHitTest {
    /// 指定位置のゾーンのキーを取得
    fn key_at(&self, x: f64, y: f64) -> Option<OsuKey>;
}

/// 論理キーに対応する矩形
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    pub key: OsuKey,
    pub rect: SurfaceRect,
}

/// ゾーンの配置
///
/// 重なる位置では先に登録されたゾーンが優先されます。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneLayout {
    zones: Vec<Zone>,
}

impl ZoneLayout {
    /// キャプチャ面を横に4等分した既定の配置（d, f, j, k）
    pub fn columns(surface: &SurfaceRect) -> Self {
        let zones = OsuKey::ALL
            .iter()
            .enumerate()
            .map(|(i, key)| Zone {
                key: *key,
                rect: surface.sub_rect(i as f64 * 0.25, 0.0, 0.25, 1.0),
            })
            .collect();
        Self { zones }
    }

    /// 設定（比率）から配置を作成
    pub fn from_config(zones: &[ZoneConfig], surface: &SurfaceRect) -> Self {
        let zones = zones
            .iter()
            .map(|z| Zone {
                key: z.key,
                rect: surface.sub_rect(z.x, z.y, z.width, z.height),
            })
            .collect();
        Self { zones }
    }

    /// ゾーン一覧
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }
}

impl ZoneHitTest for ZoneLayout {
    fn key_at(&self, x: f64, y: f64) -> Option<OsuKey> {
        self.zones
            .iter()
            .find(|zone| zone.rect.contains(x, y))
            .map(|zone| zone.key)
    }
}
