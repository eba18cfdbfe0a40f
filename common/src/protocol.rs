//! 通信プロトコル定義
//!
//! クライアントとエミュレータ間で送受信されるイベントを定義します。
//! 各メッセージは `{"event": "<名前>", "data": {...}}` 形式のJSONテキストフレームです。

use crate::error::{CommonError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// タッチ識別子（トランスポートが割り当てる整数）
pub type TouchId = i32;

/// ゲームモード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// 自由タッチモード
    #[default]
    Rizline,
    /// 2レーンのタップモード
    Musedash,
    /// 4キーのリズムゲームモード
    Osu,
}

impl GameMode {
    /// プロトコル用の文字列表現を取得
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Rizline => "rizline",
            GameMode::Musedash => "musedash",
            GameMode::Osu => "osu",
        }
    }

    /// ゾーンキー（4キー）を使用するモードかどうか
    pub fn uses_zone_keys(&self) -> bool {
        matches!(self, GameMode::Osu)
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "rizline" => Ok(GameMode::Rizline),
            "musedash" => Ok(GameMode::Musedash),
            "osu" => Ok(GameMode::Osu),
            other => Err(CommonError::InvalidParameterError(format!("不明なモード: {}", other))),
        }
    }
}

/// OSUモードの論理キー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsuKey {
    D,
    F,
    J,
    K,
}

impl OsuKey {
    /// すべてのキー（左から右の順）
    pub const ALL: [OsuKey; 4] = [OsuKey::D, OsuKey::F, OsuKey::J, OsuKey::K];

    /// キーのインデックス（0-3）
    pub fn index(&self) -> usize {
        match self {
            OsuKey::D => 0,
            OsuKey::F => 1,
            OsuKey::J => 2,
            OsuKey::K => 3,
        }
    }

    /// プロトコル用の文字列表現を取得
    pub fn as_str(&self) -> &'static str {
        match self {
            OsuKey::D => "d",
            OsuKey::F => "f",
            OsuKey::J => "j",
            OsuKey::K => "k",
        }
    }
}

impl fmt::Display for OsuKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OsuKey {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "d" => Ok(OsuKey::D),
            "f" => Ok(OsuKey::F),
            "j" => Ok(OsuKey::J),
            "k" => Ok(OsuKey::K),
            other => Err(CommonError::InvalidParameterError(format!("不明なキー: {}", other))),
        }
    }
}

/// UIボタンから送信される単発キー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemKey {
    Esc,
    Enter,
    Backspace,
    Delete,
}

impl FromStr for SystemKey {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "esc" | "escape" => Ok(SystemKey::Esc),
            "enter" => Ok(SystemKey::Enter),
            "backspace" => Ok(SystemKey::Backspace),
            "delete" => Ok(SystemKey::Delete),
            other => Err(CommonError::InvalidParameterError(format!("不明なキー: {}", other))),
        }
    }
}

/// タッチイベントの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchEventType {
    Down,
    Up,
    Cancel,
}

/// タッチの左右（Muse Dash モードのフィードバック用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchSide {
    Left,
    Right,
}

/// 自由タッチモードの生タッチイベント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchEventData {
    /// 種類
    #[serde(rename = "type")]
    pub kind: TouchEventType,
    /// タッチ識別子
    pub id: TouchId,
    /// 発生時刻（UNIXミリ秒）
    pub ts: u64,
    /// 正規化X座標（0.0-1.0）
    pub x_percent: f64,
    /// 正規化Y座標（0.0-1.0）
    pub y_percent: f64,
}

/// タッチフィードバック（表示専用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchFeedbackData {
    /// タッチ識別子
    pub id: TouchId,
    /// エミュレータが割り当てたキー
    #[serde(default)]
    pub key: Option<String>,
    /// 左右
    #[serde(default)]
    pub side: Option<TouchSide>,
    /// 正規化X座標
    pub x_percent: f64,
    /// 正規化Y座標
    pub y_percent: f64,
}

/// クライアントからエミュレータへのイベント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum OutboundEvent {
    /// 生タッチ
    TouchEvent(TouchEventData),
    /// 論理キー押下
    OsuKeyDown { key: OsuKey },
    /// 論理キー解放
    OsuKeyUp { key: OsuKey },
    /// UIボタン
    KeyPress { key: SystemKey },
    /// モード変更要求
    SetMode { mode: GameMode },
}

impl OutboundEvent {
    /// イベント名を取得
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::TouchEvent(_) => "touch_event",
            OutboundEvent::OsuKeyDown { .. } => "osu_key_down",
            OutboundEvent::OsuKeyUp { .. } => "osu_key_up",
            OutboundEvent::KeyPress { .. } => "key_press",
            OutboundEvent::SetMode { .. } => "set_mode",
        }
    }

    /// JSONテキストフレームにエンコード
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| CommonError::SerializeError(e.to_string()))
    }
}

/// エミュレータからクライアントへのイベント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum InboundEvent {
    /// トランスポート接続
    Connect,
    /// トランスポート切断
    Disconnect,
    /// 情報メッセージ
    Status { message: String },
    /// エラーメッセージ
    Error { message: String },
    /// モード変更通知（権威的）
    ModeUpdate { mode: GameMode },
    /// タッチフィードバック
    TouchFeedback(TouchFeedbackData),
}

impl InboundEvent {
    /// JSONテキストフレームからデコード
    pub fn decode(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| CommonError::DeserializeError(e.to_string()))
    }

    /// バイナリフレームからデコード
    pub fn decode_slice(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(|e| CommonError::DeserializeError(e.to_string()))
    }
}
