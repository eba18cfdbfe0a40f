//! リレーアプリケーション
//!
//! タッチスクリプト（1行1イベントのJSON）を読み込み、セッションを通して
//! エミュレータへ送信します。単一スレッドのイベントループで、ソケットの受信、
//! スクリプト入力、時間経過の処理を順番に行います。

use crate::input::{SurfaceRect, TouchPhase, TouchPoint, ZoneLayout};
use crate::network::{EventChannel, JsonLinesChannel, NetworkError, WebSocketChannel};
use crate::session::Session;
use anyhow::Context;
use serde::Deserialize;
use std::io::{BufRead, Write};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;
use touch_relay_common::utils::time::{current_time_millis, Timeout};
use touch_relay_common::{ClientConfig, GameMode, InboundEvent, SystemKey};

/// スクリプトの1行
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptEvent {
    /// タッチ
    Touch { phase: TouchPhase, touches: Vec<TouchPoint> },
    /// UIボタン
    KeyPress { key: SystemKey },
    /// モード選択
    SelectMode { mode: GameMode },
    /// キャプチャ面の大きさ変更
    Resize { width: f64, height: f64 },
    /// 待機
    Wait { ms: u64 },
}

impl ScriptEvent {
    /// 1行を解析
    ///
    /// 空行と `#` で始まる行は `None` になります。
    pub fn parse_line(line: &str) -> Result<Option<Self>, serde_json::Error> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        serde_json::from_str(line).map(Some)
    }
}

/// リレーアプリケーション
pub struct App {
    /// 設定
    config: ClientConfig,
    /// キャプチャ面
    surface: SurfaceRect,
    /// OSUゾーン
    zones: ZoneLayout,
}

impl App {
    /// 新しいアプリケーションを作成
    pub fn new(config: ClientConfig) -> Self {
        let surface = SurfaceRect::from_size(config.surface.width, config.surface.height);
        let zones = zone_layout(&config, &surface);
        Self { config, surface, zones }
    }

    /// 設定を取得
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// 現在のキャプチャ面
    pub fn surface(&self) -> &SurfaceRect {
        &self.surface
    }

    fn new_session<C: EventChannel>(&self, channel: C) -> Session<C> {
        Session::new(channel, self.config.initial_mode, &self.config.display)
    }

    /// スクリプトイベントをセッションに適用
    ///
    /// 待機イベントの場合は待機時間を返します。
    pub fn apply<C: EventChannel>(
        &mut self,
        session: &mut Session<C>,
        event: ScriptEvent,
        now_ms: u64,
    ) -> Option<Duration> {
        match event {
            ScriptEvent::Touch { phase, touches } => {
                session.on_touch(phase, &touches, &self.surface, &self.zones, now_ms);
            }
            ScriptEvent::KeyPress { key } => session.press_key(key),
            ScriptEvent::SelectMode { mode } => session.select_mode(mode),
            ScriptEvent::Resize { width, height } => {
                if width > 0.0 && height > 0.0 {
                    self.surface = SurfaceRect::from_size(width, height);
                    self.zones = zone_layout(&self.config, &self.surface);
                    log::debug!("キャプチャ面を変更しました: {}x{}", width, height);
                } else {
                    log::warn!("不正な大きさを無視します: {}x{}", width, height);
                }
            }
            ScriptEvent::Wait { ms } => return Some(Duration::from_millis(ms)),
        }
        None
    }

    /// 接続せずに送信イベントを書き出す
    pub fn run_dry<R: BufRead, W: Write>(&mut self, input: R, output: W) -> anyhow::Result<()> {
        let mut session = self.new_session(JsonLinesChannel::new(output));
        session.on_inbound(InboundEvent::Connect, current_time_millis());

        for (number, line) in input.lines().enumerate() {
            let line = line.context("スクリプトの読み込みに失敗しました")?;
            match ScriptEvent::parse_line(&line) {
                Ok(Some(event)) => {
                    if let Some(wait) = self.apply(&mut session, event, current_time_millis()) {
                        thread::sleep(wait);
                    }
                }
                Ok(None) => {}
                Err(e) => log::warn!("{}行目を無視します: {}", number + 1, e),
            }
            session.tick(current_time_millis());
        }

        session.shutdown();
        if session.dropped() > 0 {
            anyhow::bail!("{} 個のイベントを書き出せませんでした", session.dropped());
        }
        Ok(())
    }

    /// エミュレータに接続してスクリプトを再生
    ///
    /// 接続できない間もスクリプトは進み、送れなかったイベントは破棄されます。
    /// 破棄したイベント数を返します。
    pub fn run<R: BufRead + Send + 'static>(&mut self, input: R) -> anyhow::Result<u64> {
        let poll_timeout = Duration::from_millis(self.config.server.poll_interval_ms);
        let reconnect_interval = self.config.server.reconnect_interval_ms;
        let channel = WebSocketChannel::new(&self.config.server.url, poll_timeout)?;
        let mut session = self.new_session(channel);
        let events = spawn_reader(input);

        let mut link = LinkMonitor::default();
        let mut reconnect: Option<Timeout> = None;
        let mut wait: Option<Timeout> = None;
        let mut input_done = false;

        loop {
            let now = current_time_millis();

            // 受信エラーや送信失敗で切れた接続もここで検出する
            if let Some(event) = link.observe(session.channel().is_connected()) {
                if matches!(event, InboundEvent::Disconnect) {
                    reconnect = Some(Timeout::from_millis(reconnect_interval));
                }
                session.on_inbound(event, now);
            }

            let reconnect_due = reconnect.as_ref().map_or(true, Timeout::is_elapsed);
            if !session.channel().is_connected() && reconnect_due {
                if let Err(e) = session.channel_mut().connect() {
                    log::warn!("接続に失敗しました: {}", e);
                }
                reconnect = Some(Timeout::from_millis(reconnect_interval));
                if let Some(event) = link.observe(session.channel().is_connected()) {
                    session.on_inbound(event, now);
                }
            }

            if session.channel().is_connected() {
                match session.channel_mut().poll() {
                    Ok(Some(event)) => session.on_inbound(event, now),
                    Ok(None) => {}
                    Err(NetworkError::ProtocolError(e)) => {
                        log::warn!("不正なメッセージを破棄しました: {}", e);
                    }
                    Err(e) => log::warn!("{}", e),
                }
            } else {
                thread::sleep(poll_timeout);
            }

            if wait.as_ref().map_or(true, Timeout::is_elapsed) {
                wait = None;
                loop {
                    match events.try_recv() {
                        Ok(event) => {
                            let now = current_time_millis();
                            if let Some(duration) = self.apply(&mut session, event, now) {
                                wait = Some(Timeout::new(duration));
                                break;
                            }
                        }
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => {
                            input_done = true;
                            break;
                        }
                    }
                }
            }

            session.tick(current_time_millis());

            if input_done && wait.is_none() {
                break;
            }
        }

        session.shutdown();
        log::info!("スクリプトの再生が完了しました（破棄: {}）", session.dropped());
        Ok(session.dropped())
    }
}

/// 接続状態の変化を `connect` / `disconnect` イベントに変換する
#[derive(Debug, Default)]
struct LinkMonitor {
    connected: bool,
}

impl LinkMonitor {
    /// 前回から状態が変わった場合だけイベントを返す
    fn observe(&mut self, connected: bool) -> Option<InboundEvent> {
        if connected == self.connected {
            return None;
        }
        self.connected = connected;
        Some(if connected {
            InboundEvent::Connect
        } else {
            InboundEvent::Disconnect
        })
    }
}

/// 設定のゾーンから配置を作る（空なら4等分の既定配置）
fn zone_layout(config: &ClientConfig, surface: &SurfaceRect) -> ZoneLayout {
    if config.osu.zones.is_empty() {
        ZoneLayout::columns(surface)
    } else {
        ZoneLayout::from_config(&config.osu.zones, surface)
    }
}

/// スクリプトを別スレッドで読み込み、解析済みのイベントを送る
fn spawn_reader<R: BufRead + Send + 'static>(input: R) -> Receiver<ScriptEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for (number, line) in input.lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    log::error!("スクリプトの読み込みに失敗しました: {}", e);
                    break;
                }
            };
            match ScriptEvent::parse_line(&line) {
                Ok(Some(event)) => {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => log::warn!("{}行目を無視します: {}", number + 1, e),
            }
        }
    });
    rx
}
