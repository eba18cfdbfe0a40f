//! 時間ユーティリティ
//!
//! 時間処理に関連するユーティリティ機能を提供します。

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// 現在のUNIXタイムスタンプ（ミリ秒）を取得
pub fn current_time_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_millis() as u64
}

/// タイムアウト処理を提供するラッパー
#[derive(Debug, Clone)]
pub struct Timeout {
    /// 開始時刻
    start: Instant,
    /// タイムアウト時間
    duration: Duration,
}

impl Timeout {
    /// 新しいタイムアウトを作成
    pub fn new(duration: Duration) -> Self {
        Self {
            start: Instant::now(),
            duration,
        }
    }

    /// 指定されたミリ秒でタイムアウトを作成
    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    /// タイムアウトしたかどうか確認
    pub fn is_elapsed(&self) -> bool {
        self.start.elapsed() >= self.duration
    }

}
