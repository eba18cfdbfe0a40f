//! WebSocket チャネル実装
//!
//! WebSocket を使用してエミュレータと通信する機能を提供します。

use super::{EventChannel, NetworkError};
use std::io;
use std::net::TcpStream;
use std::time::Duration;
use touch_relay_common::{InboundEvent, OutboundEvent};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{connect, Message, WebSocket};
use url::Url;

/// WebSocket チャネル
pub struct WebSocketChannel {
    /// 接続先URL
    url: Url,
    /// WebSocket 接続
    socket: Option<WebSocket<MaybeTlsStream<TcpStream>>>,
    /// 受信ポーリングのタイムアウト
    poll_timeout: Duration,
}

impl WebSocketChannel {
    /// 新しい WebSocket チャネルを作成（未接続）
    pub fn new(url: &str, poll_timeout: Duration) -> Result<Self, NetworkError> {
        let url = Url::parse(url)
            .map_err(|e| NetworkError::ConnectionError(format!("Invalid URL: {}", e)))?;
        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(NetworkError::ConnectionError(format!("Unsupported scheme: {}", other)));
            }
        }

        Ok(Self {
            url,
            socket: None,
            poll_timeout,
        })
    }

    /// サーバーに接続
    pub fn connect(&mut self) -> Result<(), NetworkError> {
        let (mut socket, _) = connect(self.url.as_str()).map_err(|e| {
            NetworkError::ConnectionError(format!("WebSocket connection failed: {}", e))
        })?;

        // 受信をポーリングできるように読み込みタイムアウトを設定
        let timeout = Some(self.poll_timeout.max(Duration::from_millis(1)));
        match socket.get_mut() {
            MaybeTlsStream::Plain(stream) => stream.set_read_timeout(timeout)?,
            MaybeTlsStream::NativeTls(stream) => stream.get_mut().set_read_timeout(timeout)?,
            _ => log::warn!("読み込みタイムアウトを設定できないストリームです"),
        }

        log::info!("エミュレータに接続しました: {}", self.url);
        self.socket = Some(socket);
        Ok(())
    }

    /// サーバーから切断
    pub fn disconnect(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            let _ = socket.close(None);
            let _ = socket.write_pending();
            log::info!("エミュレータから切断しました");
        }
    }

    /// 受信イベントをポーリング
    ///
    /// タイムアウトまでに何も届かなければ `Ok(None)` を返します。
    pub fn poll(&mut self) -> Result<Option<InboundEvent>, NetworkError> {
        let Some(socket) = &mut self.socket else {
            return Err(NetworkError::NotConnected);
        };

        let message = match socket.read_message() {
            Ok(message) => message,
            Err(tungstenite::Error::Io(e))
                if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut =>
            {
                return Ok(None);
            }
            Err(e) => {
                self.socket = None;
                return Err(NetworkError::ConnectionError(format!("WebSocket read failed: {}", e)));
            }
        };

        match message {
            Message::Text(text) => Ok(Some(InboundEvent::decode(&text)?)),
            Message::Binary(data) => Ok(Some(InboundEvent::decode_slice(&data)?)),
            Message::Close(_) => {
                self.socket = None;
                Err(NetworkError::ConnectionError("Connection closed by server".to_string()))
            }
            // Ping/Pong は tungstenite が処理する
            _ => Ok(None),
        }
    }
}

impl EventChannel for WebSocketChannel {
    fn emit(&mut self, event: &OutboundEvent) -> Result<(), NetworkError> {
        let Some(socket) = &mut self.socket else {
            return Err(NetworkError::NotConnected);
        };

        let data = event.encode()?;
        if let Err(e) = socket.write_message(Message::Text(data)) {
            if matches!(
                e,
                tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed
            ) {
                self.socket = None;
            }
            return Err(NetworkError::ConnectionError(format!("WebSocket write failed: {}", e)));
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.socket.is_some()
    }
}

impl Drop for WebSocketChannel {
    fn drop(&mut self) {
        self.disconnect();
    }
}
