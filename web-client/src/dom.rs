//! DOM とのやり取り
//!
//! タッチリストの変換、ゾーンのヒットテスト、表示の反映を行います。

use touch_relay_client::ui::{FeedbackMarker, StatusMessage};
use touch_relay_client::{SurfaceRect, TouchPoint, ZoneHitTest, ZoneKeyTracker};
use touch_relay_common::{GameMode, OsuKey};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, HtmlSelectElement, TouchEvent};

/// ページ上の要素
pub struct Page {
    pub document: Document,
    /// 自由タッチ用のキャプチャ面
    pub canvas: HtmlElement,
    /// OSUゾーンのオーバーレイ
    pub overlay: Option<HtmlElement>,
    /// ステータス行
    pub info: Option<Element>,
    /// モード選択
    pub mode_select: Option<HtmlSelectElement>,
    /// フィードバックの描画先
    pub feedback_layer: Element,
}

impl Page {
    /// 要素を取得
    pub fn locate(document: &Document) -> Result<Self, JsValue> {
        let canvas = document
            .get_element_by_id("c")
            .ok_or_else(|| JsValue::from_str("キャンバスが見つかりません"))?
            .dyn_into::<HtmlElement>()?;
        let overlay = document
            .get_element_by_id("osu-overlay")
            .and_then(|e| e.dyn_into::<HtmlElement>().ok());
        let mode_select = document
            .get_element_by_id("mode-select")
            .and_then(|e| e.dyn_into::<HtmlSelectElement>().ok());

        let feedback_layer = match document.get_element_by_id("feedback-layer") {
            Some(layer) => layer,
            None => {
                let layer = document.create_element("div")?;
                layer.set_id("feedback-layer");
                let body = document
                    .body()
                    .ok_or_else(|| JsValue::from_str("ドキュメントのボディが見つかりません"))?;
                body.append_child(&layer)?;
                layer
            }
        };

        Ok(Self {
            document: document.clone(),
            canvas,
            info: document.get_element_by_id("info"),
            overlay,
            mode_select,
            feedback_layer,
        })
    }

    /// キャプチャ面の現在の矩形（毎回取得する）
    pub fn surface(&self) -> SurfaceRect {
        let rect = self.canvas.get_bounding_client_rect();
        SurfaceRect::new(rect.left(), rect.top(), rect.width(), rect.height())
    }

    /// モードに合わせてオーバーレイとモード選択を切り替え
    pub fn apply_mode(&self, mode: GameMode) {
        if let Some(select) = &self.mode_select {
            select.set_value(mode.as_str());
        }
        if let Some(overlay) = &self.overlay {
            let _ = overlay.class_list().toggle_with_force("active", mode.uses_zone_keys());
        }
        let pointer_events = if mode.uses_zone_keys() { "none" } else { "auto" };
        let _ = self.canvas.style().set_property("pointer-events", pointer_events);
    }

    /// ゾーンの押下表示を反映
    pub fn render_zones(&self, tracker: &ZoneKeyTracker) {
        for key in OsuKey::ALL {
            let selector = format!("[data-key=\"{}\"]", key);
            if let Ok(Some(zone)) = self.document.query_selector(&selector) {
                let _ = zone.class_list().toggle_with_force("pressed", tracker.is_pressed(key));
            }
        }
    }

    /// ステータス行を反映
    pub fn render_status(&self, message: &StatusMessage) {
        if let Some(info) = &self.info {
            info.set_text_content(Some(&message.text));
            info.set_class_name(message.tone.css_class());
        }
    }

    /// フィードバックマーカーを描き直す
    pub fn render_feedback(&self, markers: &[FeedbackMarker]) {
        self.feedback_layer.set_inner_html("");
        for marker in markers {
            let Ok(dot) = self.document.create_element("div") else {
                continue;
            };
            dot.set_class_name(&format!("touch-dot {}", marker.style.css_class()));
            let style = format!(
                "display:block;left:{}vw;top:{}vh",
                marker.x_percent * 100.0,
                marker.y_percent * 100.0
            );
            let _ = dot.set_attribute("style", &style);
            let _ = self.feedback_layer.append_child(&dot);
        }
    }
}

/// `.osu-zone` 要素の `data-key` 属性でヒットテストする
pub struct DomZones<'a> {
    document: &'a Document,
}

impl<'a> DomZones<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }
}

impl ZoneHitTest for DomZones<'_> {
    fn key_at(&self, x: f64, y: f64) -> Option<OsuKey> {
        if !(x.is_finite() && y.is_finite()) {
            return None;
        }
        let element = self.document.element_from_point(x as f32, y as f32)?;
        if !element.class_list().contains("osu-zone") {
            return None;
        }
        element.get_attribute("data-key")?.parse().ok()
    }
}

/// 変化したタッチを取り出す
pub fn changed_touches(event: &TouchEvent) -> Vec<TouchPoint> {
    let list = event.changed_touches();
    (0..list.length())
        .filter_map(|i| list.get(i))
        .map(|touch| {
            TouchPoint::new(
                touch.identifier(),
                touch.client_x() as f64,
                touch.client_y() as f64,
            )
        })
        .collect()
}
