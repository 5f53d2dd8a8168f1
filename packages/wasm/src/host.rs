use crate::web_dom::WebNode;
use folio_editor::Editor;
use folio_model::Value;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use wasm_bindgen::JsValue;

/// State shared between the JS class and its event closures.
///
/// The change callback is never invoked while the editor is borrowed: the
/// editor only records the latest value, and [`Host::flush`] hands it to JS
/// once the borrow is released. JS may re-render synchronously from that
/// callback.
pub struct Host {
    pub editor: RefCell<Editor<WebNode>>,
    pub latest: Rc<RefCell<Option<Arc<Value>>>>,
    pub on_change: js_sys::Function,
}

impl Host {
    pub fn with_editor<R>(&self, f: impl FnOnce(&mut Editor<WebNode>) -> R) -> Option<R> {
        let result = match self.editor.try_borrow_mut() {
            Ok(mut editor) => f(&mut editor),
            Err(_) => {
                tracing::warn!("editor is busy, event dropped");
                return None;
            }
        };
        self.flush();
        Some(result)
    }

    pub fn flush(&self) {
        let Some(value) = self.latest.borrow_mut().take() else {
            return;
        };
        match value.to_json() {
            Ok(json) => {
                if let Err(err) = self.on_change.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
                    tracing::warn!(error = ?err, "onChange threw");
                }
            }
            Err(err) => tracing::warn!(error = %err, "could not serialize value"),
        }
    }
}
