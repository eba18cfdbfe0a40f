//! 設定管理
//!
//! クライアント設定の読み込み、保存、および検証機能を提供します。

use crate::protocol::{GameMode, OsuKey};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 環境変数: 接続先URL
pub const ENV_URL: &str = "TOUCH_RELAY_URL";
/// 環境変数: ログレベル
pub const ENV_LOG: &str = "TOUCH_RELAY_LOG";

/// 設定エラー
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O エラー
    #[error("設定の読み書き中にI/Oエラーが発生しました: {0}")]
    IoError(#[from] io::Error),

    /// JSON エラー
    #[error("JSONの解析に失敗しました: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML デシリアライズエラー
    #[error("TOMLの解析に失敗しました: {0}")]
    TomlDeError(#[from] toml::de::Error),

    /// TOML シリアライズエラー
    #[error("TOMLのシリアライズに失敗しました: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    /// 設定値が不正
    #[error("設定値が不正です: {0}")]
    Invalid(String),
}

/// 設定形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFormat {
    /// JSON 形式
    Json,
    /// TOML 形式
    #[default]
    Toml,
}

impl ConfigFormat {
    /// ファイル拡張子から設定形式を判定
    pub fn from_extension(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }
}

/// エミュレータ接続設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// WebSocket URL
    pub url: String,
    /// 再接続間隔（ミリ秒）
    pub reconnect_interval_ms: u64,
    /// 受信ポーリングのタイムアウト（ミリ秒）
    pub poll_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:5000/ws".to_string(),
            reconnect_interval_ms: 2000,
            poll_interval_ms: 10,
        }
    }
}

/// キャプチャ面の大きさ（ピクセル）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
        }
    }
}

/// OSUゾーン1つ分の設定（キャプチャ面に対する比率）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub key: OsuKey,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// OSUモード設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OsuConfig {
    /// ゾーン一覧（先に書かれたゾーンが優先）
    pub zones: Vec<ZoneConfig>,
}

impl Default for OsuConfig {
    fn default() -> Self {
        // 横方向に4等分した縦長のゾーン
        let zones = OsuKey::ALL
            .iter()
            .enumerate()
            .map(|(i, key)| ZoneConfig {
                key: *key,
                x: i as f64 * 0.25,
                y: 0.0,
                width: 0.25,
                height: 1.0,
            })
            .collect();
        Self { zones }
    }
}

/// 表示設定
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// エラーメッセージを元に戻すまでの時間（ミリ秒）
    pub error_revert_ms: u64,
    /// タッチフィードバックの表示時間（ミリ秒）
    pub feedback_lifetime_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            error_revert_ms: 2000,
            feedback_lifetime_ms: 400,
        }
    }
}

/// クライアント設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// 起動時のモード
    pub initial_mode: GameMode,
    /// ログレベル
    pub log_level: String,
    pub server: ServerConfig,
    pub surface: SurfaceConfig,
    pub osu: OsuConfig,
    pub display: DisplayConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            initial_mode: GameMode::default(),
            log_level: "info".to_string(),
            server: ServerConfig::default(),
            surface: SurfaceConfig::default(),
            osu: OsuConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl ClientConfig {
    /// 既定の設定ファイルパスを取得
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("touch-relay")
            .join("config.toml")
    }

    /// 文字列から設定を読み込み
    pub fn from_str_with_format(content: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let config: ClientConfig = match format {
            ConfigFormat::Json => serde_json::from_str(content)?,
            ConfigFormat::Toml => toml::from_str(content)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// ファイルから設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_extension(path).unwrap_or_default();

        let mut file = File::open(path)?;
        let mut content = String::new();
        file.read_to_string(&mut content)?;

        Self::from_str_with_format(&content, format)
    }

    /// ファイルが存在すれば読み込み、なければ既定値を返す
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            log::debug!("設定ファイルがないため既定値を使用します: {:?}", path);
            Ok(Self::default())
        }
    }

    /// 文字列に変換
    pub fn to_string_with_format(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        Ok(match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string(self)?,
        })
    }

    /// 環境変数で上書き
    pub fn apply_env(&mut self) {
        self.apply_overrides(std::env::var(ENV_URL).ok(), std::env::var(ENV_LOG).ok());
    }

    /// URLとログレベルを上書き（空文字は無視）
    pub fn apply_overrides(&mut self, url: Option<String>, log_level: Option<String>) {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.server.url = url;
        }
        if let Some(level) = log_level.filter(|l| !l.trim().is_empty()) {
            self.log_level = level;
        }
    }

    /// 設定値を検証
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.surface.width > 0.0 && self.surface.height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "キャプチャ面の大きさが不正です: {}x{}",
                self.surface.width, self.surface.height
            )));
        }

        for zone in &self.osu.zones {
            let in_unit = |v: f64| (0.0..=1.0).contains(&v);
            if !(in_unit(zone.x) && in_unit(zone.y))
                || !(zone.width > 0.0 && zone.height > 0.0)
                || zone.x + zone.width > 1.0 + f64::EPSILON
                || zone.y + zone.height > 1.0 + f64::EPSILON
            {
                return Err(ConfigError::Invalid(format!("ゾーン '{}' の範囲が不正です", zone.key)));
            }
        }

        if self.server.url.trim().is_empty() {
            return Err(ConfigError::Invalid("接続先URLが空です".to_string()));
        }

        Ok(())
    }
}
