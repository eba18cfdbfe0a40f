//! UIモジュール
//!
//! 描画に依存しない表示モデル（ステータス行とタッチフィードバック）を提供します。
//! 実際の描画はブラウザ側が担当します。

mod feedback;
mod status;

pub use feedback::{FeedbackLayer, FeedbackMarker, MarkerStyle};
pub use status::{StatusLine, StatusMessage, StatusTone};
