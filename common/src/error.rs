//! エラー型定義
//!
//! タッチリレーで使用する共通エラー型を定義します。

use std::io;
use thiserror::Error;

/// 共通エラー
#[derive(Error, Debug)]
pub enum CommonError {
    /// 入出力エラー
    #[error("I/Oエラー: {0}")]
    IoError(#[from] io::Error),

    /// シリアライズエラー
    #[error("シリアライズエラー: {0}")]
    SerializeError(String),

    /// デシリアライズエラー
    #[error("デシリアライズエラー: {0}")]
    DeserializeError(String),

    /// 無効なパラメータ
    #[error("無効なパラメータ: {0}")]
    InvalidParameterError(String),

    /// その他のエラー
    #[error("{0}")]
    Other(String),
}

/// 結果型のエイリアス
pub type Result<T> = std::result::Result<T, CommonError>;
