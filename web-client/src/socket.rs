//! ブラウザの WebSocket チャネル
//!
//! `web_sys::WebSocket` の上に `EventChannel` を実装します。

use touch_relay_client::{EventChannel, NetworkError};
use touch_relay_common::OutboundEvent;
use wasm_bindgen::JsValue;
use web_sys::{WebSocket, Window};

/// WebSocket チャネル
pub struct SocketChannel {
    url: String,
    socket: WebSocket,
}

impl SocketChannel {
    /// 接続を開始
    pub fn open(url: &str) -> Result<Self, JsValue> {
        let socket = WebSocket::new(url)?;
        Ok(Self {
            url: url.to_string(),
            socket,
        })
    }

    /// 同じURLで接続し直す
    pub fn reopen(&mut self) -> Result<(), JsValue> {
        self.socket = WebSocket::new(&self.url)?;
        Ok(())
    }

    pub fn socket(&self) -> &WebSocket {
        &self.socket
    }
}

impl EventChannel for SocketChannel {
    fn emit(&mut self, event: &OutboundEvent) -> Result<(), NetworkError> {
        if !self.is_connected() {
            return Err(NetworkError::NotConnected);
        }
        let data = event.encode()?;
        self.socket
            .send_with_str(&data)
            .map_err(|e| NetworkError::ConnectionError(format!("{:?}", e)))
    }

    fn is_connected(&self) -> bool {
        self.socket.ready_state() == WebSocket::OPEN
    }
}

/// ページと同じホストの WebSocket URL を構築
pub fn default_url(window: &Window) -> Result<String, JsValue> {
    let location = window.location();
    let scheme = if location.protocol()? == "https:" { "wss" } else { "ws" };
    Ok(format!("{}://{}/ws", scheme, location.host()?))
}
