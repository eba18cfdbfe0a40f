//! タッチリレー共通ライブラリ
//!
//! このクレートは、タッチリレーのクライアントとWebクライアントの両方で使用される
//! プロトコル定義、エラー型、設定、ユーティリティを提供します。

pub mod config;
pub mod error;
pub mod protocol;
pub mod utils;

// 主要コンポーネントを再エクスポート
pub use config::{ClientConfig, ConfigError};
pub use error::{CommonError, Result};
pub use protocol::{
    GameMode, InboundEvent, OsuKey, OutboundEvent, SystemKey, TouchEventData, TouchEventType,
    TouchFeedbackData, TouchId, TouchSide,
};

/// ライブラリのバージョン
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
