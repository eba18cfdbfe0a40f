//! ネットワークモジュール
//!
//! エミュレータとのイベントチャネルを提供します。
//! 送信は投げっぱなしで、失敗したイベントは呼び出し側で破棄されます。

#[cfg(feature = "native")]
mod websocket_client;

#[cfg(feature = "native")]
pub use websocket_client::WebSocketChannel;

use std::io::{self, Write};
use thiserror::Error;
use touch_relay_common::{CommonError, OutboundEvent};

/// ネットワークエラー
#[derive(Error, Debug)]
pub enum NetworkError {
    /// 接続エラー
    #[error("接続エラー: {0}")]
    ConnectionError(String),

    /// 未接続
    #[error("接続されていません")]
    NotConnected,

    /// IO エラー
    #[error("IO エラー: {0}")]
    IoError(#[from] io::Error),

    /// プロトコルエラー
    #[error("プロトコルエラー: {0}")]
    ProtocolError(String),
}

impl From<CommonError> for NetworkError {
    fn from(e: CommonError) -> Self {
        NetworkError::ProtocolError(e.to_string())
    }
}

/// 送信側のイベントチャネル
///
/// 書き込みは同期的で、応答や再送はありません。
pub trait EventChannel {
    /// イベントを送信
    fn emit(&mut self, event: &OutboundEvent) -> Result<(), NetworkError>;

    /// 接続されているかどうか
    fn is_connected(&self) -> bool;
}

impl<C: EventChannel + ?Sized> EventChannel for Box<C> {
    fn emit(&mut self, event: &OutboundEvent) -> Result<(), NetworkError> {
        (**self).emit(event)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}

/// 1行1イベントのJSONを書き出すチャネル
///
/// ドライラン時の標準出力などに使用します。
pub struct JsonLinesChannel<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesChannel<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// 内部のライターを取り出す
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventChannel for JsonLinesChannel<W> {
    fn emit(&mut self, event: &OutboundEvent) -> Result<(), NetworkError> {
        let line = event.encode()?;
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }
}
