//! ユーティリティモジュール
//!
//! 各種ユーティリティ機能を提供します。

pub mod logging;
pub mod time;
