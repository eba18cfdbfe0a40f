//! Webクライアントエントリポイント
//!
//! このクレートは、タッチリレーのブラウザ側の結線を提供します。
//! WebAssemblyにコンパイルされ、ページ上のタッチを `Session` に渡し、
//! WebSocket 経由でエミュレータへ送ります。

mod dom;
mod socket;

use dom::{DomZones, Page};
use socket::SocketChannel;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use touch_relay_client::{Session, TouchPhase};
use touch_relay_common::{ClientConfig, GameMode, InboundEvent, SystemKey, VERSION};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    window, AddEventListenerOptions, HtmlElement, MessageEvent, TouchEvent, WebSocket, Window,
};

/// 表示の更新間隔（ミリ秒）
const TICK_INTERVAL_MS: i32 = 100;

thread_local! {
    static CLIENT: RefCell<Option<Rc<Client>>> = RefCell::new(None);
}

fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

/// WebSocket のイベントハンドラ
///
/// 再接続のたびに新しいソケットへ付け替えます。
struct SocketHandlers {
    open: Closure<dyn FnMut()>,
    message: Closure<dyn FnMut(MessageEvent)>,
    close: Closure<dyn FnMut()>,
    reconnect: Closure<dyn FnMut()>,
}

impl SocketHandlers {
    fn attach(&self, socket: &WebSocket) {
        socket.set_onopen(Some(self.open.as_ref().unchecked_ref()));
        socket.set_onmessage(Some(self.message.as_ref().unchecked_ref()));
        socket.set_onclose(Some(self.close.as_ref().unchecked_ref()));
    }
}

/// ページ上のクライアント
struct Client {
    window: Window,
    page: Page,
    session: RefCell<Session<SocketChannel>>,
    handlers: RefCell<Option<SocketHandlers>>,
    reconnect_interval_ms: i32,
}

impl Client {
    /// 表示をセッションの状態に合わせる
    fn render(&self) {
        let session = self.session.borrow();
        self.page.apply_mode(session.mode());
        self.page.render_zones(session.key_tracker());
        self.page.render_status(session.status().current());
        self.page.render_feedback(session.feedback().markers());
    }

    fn on_touch(&self, phase: TouchPhase, event: &TouchEvent) {
        let touches = dom::changed_touches(event);
        let surface = self.page.surface();
        let zones = DomZones::new(&self.page.document);
        {
            let mut session = self.session.borrow_mut();
            session.on_touch(phase, &touches, &surface, &zones, now_ms());
        }
        self.page.render_zones(self.session.borrow().key_tracker());
    }

    fn on_inbound(&self, event: InboundEvent) {
        self.session.borrow_mut().on_inbound(event, now_ms());
        self.render();
    }

    fn attach_socket(&self) {
        let session = self.session.borrow();
        if let Some(handlers) = self.handlers.borrow().as_ref() {
            handlers.attach(session.channel().socket());
        }
    }

    fn schedule_reconnect(&self) {
        let handlers = self.handlers.borrow();
        let Some(handlers) = handlers.as_ref() else {
            return;
        };
        let result = self.window.set_timeout_with_callback_and_timeout_and_arguments_0(
            handlers.reconnect.as_ref().unchecked_ref(),
            self.reconnect_interval_ms,
        );
        if let Err(e) = result {
            log::error!("再接続を予約できません: {:?}", e);
        }
    }

    fn reconnect(&self) {
        log::info!("再接続を試みます");
        let result = self.session.borrow_mut().channel_mut().reopen();
        match result {
            Ok(()) => self.attach_socket(),
            Err(e) => {
                log::warn!("再接続に失敗しました: {:?}", e);
                self.schedule_reconnect();
            }
        }
    }
}

fn socket_handlers(client: &Rc<Client>) -> SocketHandlers {
    let weak = Rc::downgrade(client);
    let open = Closure::<dyn FnMut()>::new(move || {
        if let Some(client) = weak.upgrade() {
            client.on_inbound(InboundEvent::Connect);
        }
    });

    let weak = Rc::downgrade(client);
    let message = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
        let Some(client) = weak.upgrade() else {
            return;
        };
        let Some(text) = event.data().as_string() else {
            log::debug!("テキスト以外のメッセージを無視します");
            return;
        };
        match InboundEvent::decode(&text) {
            Ok(event) => client.on_inbound(event),
            Err(e) => log::warn!("受信イベントを解析できません: {}", e),
        }
    });

    let weak = Rc::downgrade(client);
    let close = Closure::<dyn FnMut()>::new(move || {
        if let Some(client) = weak.upgrade() {
            client.on_inbound(InboundEvent::Disconnect);
            client.schedule_reconnect();
        }
    });

    let weak = Rc::downgrade(client);
    let reconnect = Closure::<dyn FnMut()>::new(move || {
        if let Some(client) = weak.upgrade() {
            client.reconnect();
        }
    });

    SocketHandlers {
        open,
        message,
        close,
        reconnect,
    }
}

fn bind_touch(client: &Rc<Client>, target: &HtmlElement) -> Result<(), JsValue> {
    let options = AddEventListenerOptions::new();
    options.set_passive(false);

    let phases = [
        ("touchstart", TouchPhase::Start),
        ("touchmove", TouchPhase::Move),
        ("touchend", TouchPhase::End),
        ("touchcancel", TouchPhase::Cancel),
    ];
    for (name, phase) in phases {
        let weak: Weak<Client> = Rc::downgrade(client);
        let handler = Closure::<dyn FnMut(TouchEvent)>::new(move |event: TouchEvent| {
            event.prevent_default();
            if let Some(client) = weak.upgrade() {
                client.on_touch(phase, &event);
            }
        });
        target.add_event_listener_with_callback_and_add_event_listener_options(
            name,
            handler.as_ref().unchecked_ref(),
            &options,
        )?;
        handler.forget();
    }
    Ok(())
}

fn bind_buttons(client: &Rc<Client>) -> Result<(), JsValue> {
    let buttons = [
        ("esc-btn", SystemKey::Esc),
        ("enter-btn", SystemKey::Enter),
        ("backspace-btn", SystemKey::Backspace),
        ("delete-btn", SystemKey::Delete),
    ];
    for (id, key) in buttons {
        let Some(button) = client.page.document.get_element_by_id(id) else {
            log::debug!("ボタンが見つかりません: {}", id);
            continue;
        };
        let weak = Rc::downgrade(client);
        let handler = Closure::<dyn FnMut()>::new(move || {
            if let Some(client) = weak.upgrade() {
                client.session.borrow_mut().press_key(key);
            }
        });
        button.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref())?;
        handler.forget();
    }
    Ok(())
}

fn bind_mode_select(client: &Rc<Client>) -> Result<(), JsValue> {
    let Some(select) = client.page.mode_select.clone() else {
        log::debug!("モード選択が見つかりません");
        return Ok(());
    };
    let weak = Rc::downgrade(client);
    let target = select.clone();
    let handler = Closure::<dyn FnMut()>::new(move || {
        let Some(client) = weak.upgrade() else {
            return;
        };
        match target.value().parse::<GameMode>() {
            Ok(mode) => {
                client.session.borrow_mut().select_mode(mode);
                client.render();
            }
            Err(e) => log::warn!("{}", e),
        }
    });
    select.add_event_listener_with_callback("change", handler.as_ref().unchecked_ref())?;
    handler.forget();
    Ok(())
}

fn start_ticker(client: &Rc<Client>) -> Result<(), JsValue> {
    let weak = Rc::downgrade(client);
    let handler = Closure::<dyn FnMut()>::new(move || {
        if let Some(client) = weak.upgrade() {
            client.session.borrow_mut().tick(now_ms());
            client.render();
        }
    });
    client.window.set_interval_with_callback_and_timeout_and_arguments_0(
        handler.as_ref().unchecked_ref(),
        TICK_INTERVAL_MS,
    )?;
    handler.forget();
    Ok(())
}

/// Webクライアントの初期化
#[wasm_bindgen]
pub fn initialize() -> Result<(), JsValue> {
    // パニック時のフックを設定
    #[cfg(feature = "development")]
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));

    // ロガーを初期化
    wasm_logger::init(wasm_logger::Config::default());

    log::info!("Webクライアントを初期化中...");

    let window = window().ok_or_else(|| JsValue::from_str("ウィンドウが見つかりません"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("ドキュメントが見つかりません"))?;
    let page = Page::locate(&document)?;

    let config = ClientConfig::default();
    let url = socket::default_url(&window)?;
    log::info!("接続先: {}", url);
    let channel = SocketChannel::open(&url)?;

    let client = Rc::new(Client {
        window,
        page,
        session: RefCell::new(Session::new(channel, config.initial_mode, &config.display)),
        handlers: RefCell::new(None),
        reconnect_interval_ms: config.server.reconnect_interval_ms as i32,
    });

    *client.handlers.borrow_mut() = Some(socket_handlers(&client));
    client.attach_socket();

    bind_touch(&client, &client.page.canvas)?;
    if let Some(overlay) = &client.page.overlay {
        bind_touch(&client, overlay)?;
    }
    bind_buttons(&client)?;
    bind_mode_select(&client)?;
    start_ticker(&client)?;

    client.render();
    CLIENT.with(|slot| *slot.borrow_mut() = Some(client));

    log::info!("Webクライアントの初期化が完了しました");
    Ok(())
}

/// バージョン情報を取得
#[wasm_bindgen]
pub fn get_version() -> String {
    VERSION.to_string()
}

/// Webクライアントをシャットダウン
///
/// 押下中のキーをすべて解放します。ページを離れる前に呼び出してください。
#[wasm_bindgen]
pub fn shutdown() {
    log::info!("Webクライアントをシャットダウン中...");
    CLIENT.with(|slot| {
        if let Some(client) = slot.borrow().as_ref() {
            client.session.borrow_mut().shutdown();
            client.render();
        }
    });
}
