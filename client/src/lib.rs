//! タッチリレークライアント
//!
//! タッチ入力をゲームモードごとのプロトコルイベントに変換し、
//! エミュレータへ中継するクライアントの中核部分です。
//! ブラウザ版（`web-client`）とネイティブ版の両方から使用されます。

pub mod input;
pub mod network;
pub mod session;
pub mod ui;

#[cfg(feature = "native")]
pub mod app;

pub use input::{
    SurfaceRect, TouchPhase, TouchPoint, TouchTracker, ZoneHitTest, ZoneKeyTracker, ZoneLayout,
};
pub use network::{EventChannel, NetworkError};
pub use session::Session;
