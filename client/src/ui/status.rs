//! ステータス表示
//!
//! 接続状態やエミュレータからのメッセージを1行で表示するためのモデルです。
//! エラーメッセージは一定時間後に現在のモード表示へ戻ります。

use touch_relay_common::GameMode;

/// 表示の色合い
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    /// 接続済みなど
    Success,
    /// 通常の情報
    Info,
    /// 一時的な警告
    Warning,
    /// 切断など
    Danger,
}

impl StatusTone {
    /// CSSクラス名
    pub fn css_class(&self) -> &'static str {
        match self {
            StatusTone::Success => "status-success",
            StatusTone::Info => "status-info",
            StatusTone::Warning => "status-warning",
            StatusTone::Danger => "status-danger",
        }
    }
}

/// ステータスメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub tone: StatusTone,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>, tone: StatusTone) -> Self {
        Self { text: text.into(), tone }
    }
}

/// ステータス行
#[derive(Debug, Clone)]
pub struct StatusLine {
    /// 現在のメッセージ
    current: StatusMessage,
    /// モード表示へ戻す時刻（UNIXミリ秒）
    revert_at: Option<u64>,
    /// エラー表示の時間（ミリ秒）
    error_revert_ms: u64,
}

impl StatusLine {
    pub fn new(error_revert_ms: u64) -> Self {
        Self {
            current: StatusMessage::new("接続中...", StatusTone::Info),
            revert_at: None,
            error_revert_ms,
        }
    }

    /// 現在のメッセージ
    pub fn current(&self) -> &StatusMessage {
        &self.current
    }

    fn show(&mut self, message: StatusMessage) {
        self.current = message;
        self.revert_at = None;
    }

    /// 接続
    pub fn connected(&mut self) {
        self.show(StatusMessage::new("✓ 接続済み", StatusTone::Success));
    }

    /// 切断
    pub fn disconnected(&mut self) {
        self.show(StatusMessage::new("✗ 接続が切断されました", StatusTone::Danger));
    }

    /// エミュレータからの情報メッセージ
    pub fn status(&mut self, message: &str) {
        self.show(StatusMessage::new(message, StatusTone::Info));
    }

    /// モード表示
    pub fn mode(&mut self, mode: GameMode) {
        self.show(Self::mode_message(mode));
    }

    /// エラー表示（`now_ms` から一定時間後に戻る）
    pub fn error(&mut self, message: &str, now_ms: u64) {
        self.current = StatusMessage::new(format!("⚠ {}", message), StatusTone::Warning);
        self.revert_at = Some(now_ms.saturating_add(self.error_revert_ms));
    }

    /// 期限が来たエラー表示をモード表示に戻す
    ///
    /// 表示が変わった場合は `true` を返します。
    pub fn tick(&mut self, now_ms: u64, mode: GameMode) -> bool {
        match self.revert_at {
            Some(at) if now_ms >= at => {
                self.show(Self::mode_message(mode));
                true
            }
            _ => false,
        }
    }

    fn mode_message(mode: GameMode) -> StatusMessage {
        StatusMessage::new(format!("モード: {}", mode), StatusTone::Info)
    }
}
