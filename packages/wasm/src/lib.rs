//! Browser binding for the folio editor.
//!
//! `FolioEditor` owns an [`folio_editor::Editor`] over live DOM nodes, wires
//! the contentEditable root's events into it, and hands each new document
//! value back to JS as JSON. The JS view renders the value, attaches
//! `refCallback(path)` to every rendered node, and calls `layoutEffect()`
//! after each commit.

mod frames;
mod host;
pub mod web_dom;

use folio_editor::{BeforeInput, Editor, EditorOptions, SelectionSurface};
use folio_model::{Path, Value};
use frames::AnimationFrames;
use host::Host;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_dom::{mutation_record, target_ranges, WebNode, WebSelection};

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

pub fn path_from_js(indices: &[u32]) -> Path {
    Path::new(indices.iter().map(|index| *index as usize).collect())
}

type RefFunction = Closure<dyn FnMut(JsValue)>;

#[wasm_bindgen]
pub struct FolioEditor {
    host: Rc<Host>,
    root: web_sys::HtmlElement,
    document: web_sys::Document,
    listeners: Option<Listeners>,
    ref_functions: RefCell<HashMap<Path, RefFunction>>,
}

#[wasm_bindgen]
impl FolioEditor {
    /// `onChange` receives each new value as a JSON string.
    #[wasm_bindgen(constructor)]
    pub fn new(
        root: web_sys::HtmlElement,
        value_json: &str,
        on_change: js_sys::Function,
        options_json: Option<String>,
    ) -> Result<FolioEditor, JsValue> {
        let value = Value::from_json(value_json).map_err(js_error)?;
        let options = match options_json {
            Some(json) => EditorOptions::from_json(&json).map_err(js_error)?,
            None => EditorOptions::default(),
        };
        let document = root
            .owner_document()
            .ok_or_else(|| JsValue::from_str("editor root is not attached to a document"))?;

        let latest = Rc::new(RefCell::new(None));
        let sink = latest.clone();
        let host = Rc::new_cyclic(|weak: &Weak<Host>| Host {
            editor: RefCell::new(
                Editor::new(value, AnimationFrames::new(weak.clone()))
                    .with_options(options)
                    .on_change(move |value: &Arc<Value>| {
                        *sink.borrow_mut() = Some(value.clone());
                    }),
            ),
            latest,
            on_change,
        });

        let listeners = Listeners::attach(&root, &document, &host)?;
        tracing::debug!("editor mounted");
        Ok(FolioEditor {
            host,
            root,
            document,
            listeners: Some(listeners),
            ref_functions: RefCell::new(HashMap::new()),
        })
    }

    /// Stable ref callback for the node rendered at `path`.
    #[wasm_bindgen(js_name = refCallback)]
    pub fn ref_callback(&self, path: Vec<u32>) -> js_sys::Function {
        let path = path_from_js(&path);
        let mut functions = self.ref_functions.borrow_mut();
        let function = functions.entry(path.clone()).or_insert_with(|| {
            let host = Rc::downgrade(&self.host);
            Closure::wrap(Box::new(move |node: JsValue| {
                let Some(host) = host.upgrade() else {
                    return;
                };
                let node = node.dyn_into::<web_sys::Node>().ok().map(WebNode::new);
                let callback = match host.editor.try_borrow() {
                    Ok(editor) => editor.ref_callback(&path),
                    Err(_) => {
                        tracing::warn!(%path, "ref callback fired while the editor was busy");
                        return;
                    }
                };
                callback.call(node);
            }) as Box<dyn FnMut(JsValue)>)
        });
        function.as_ref().clone().unchecked_into()
    }

    /// Run after every render commit, before paint. Returns whether the native
    /// selection was written.
    #[wasm_bindgen(js_name = layoutEffect)]
    pub fn layout_effect(&self) -> bool {
        let root = WebNode::new(self.root.clone().into());
        let mut surface = WebSelection::new(self.document.clone());
        let written = self
            .host
            .with_editor(|editor| {
                editor.check_rendered(&root);
                editor.sync_selection(&mut surface)
            })
            .unwrap_or(false);
        self.prune_ref_functions();
        written
    }

    /// Replace the document from outside (controlled mode). Does not call
    /// `onChange`.
    #[wasm_bindgen(js_name = setValue)]
    pub fn set_value(&self, value_json: &str) -> Result<(), JsValue> {
        let value = Value::from_json(value_json).map_err(js_error)?;
        self.host
            .with_editor(|editor| editor.set_value(Arc::new(value)))
            .ok_or_else(|| JsValue::from_str("editor is busy"))
    }

    pub fn value(&self) -> Result<String, JsValue> {
        let editor = self.host.editor.try_borrow().map_err(js_error)?;
        editor.value().to_json().map_err(js_error)
    }

    /// Detach every listener and forget all registered nodes.
    pub fn destroy(&mut self) {
        self.listeners = None;
        self.ref_functions.borrow_mut().clear();
        self.host.with_editor(|editor| editor.reset_registry());
        tracing::debug!("editor destroyed");
    }
}

impl FolioEditor {
    /// Number of ref functions currently handed out
    pub fn ref_function_count(&self) -> usize {
        self.ref_functions.borrow().len()
    }

    /// Drop the ref functions of paths nothing is rendered at after a commit
    fn prune_ref_functions(&self) {
        let Ok(editor) = self.host.editor.try_borrow() else {
            return;
        };
        let registry = editor.registry();
        let registry = registry.borrow();
        self.ref_functions
            .borrow_mut()
            .retain(|path, _| registry.by_path(path).is_some());
    }
}

struct Listeners {
    root: web_sys::HtmlElement,
    document: web_sys::Document,
    before_input: Closure<dyn FnMut(web_sys::InputEvent)>,
    focus: Closure<dyn FnMut(web_sys::Event)>,
    blur: Closure<dyn FnMut(web_sys::Event)>,
    selection_change: Closure<dyn FnMut(web_sys::Event)>,
    observer: web_sys::MutationObserver,
    _on_mutations: Closure<dyn FnMut(js_sys::Array, web_sys::MutationObserver)>,
}

impl Listeners {
    fn attach(root: &web_sys::HtmlElement, document: &web_sys::Document, host: &Rc<Host>) -> Result<Self, JsValue> {
        let before_input = {
            let host = Rc::downgrade(host);
            let selection = WebSelection::new(document.clone());
            Closure::wrap(Box::new(move |event: web_sys::InputEvent| {
                let Some(host) = host.upgrade() else {
                    return;
                };
                let mut input = BeforeInput::new(&event.input_type());
                if let Some(data) = event.data() {
                    input = input.with_data(data);
                }
                for range in target_ranges(&event) {
                    input = input.with_target_range(range);
                }
                let native = selection.range();
                let prevent = host.with_editor(|editor| editor.handle_before_input(&input, native.as_ref()).prevents_default());
                if prevent == Some(true) {
                    event.prevent_default();
                }
            }) as Box<dyn FnMut(web_sys::InputEvent)>)
        };

        let focus = {
            let host = Rc::downgrade(host);
            Closure::wrap(Box::new(move |_event: web_sys::Event| {
                if let Some(host) = host.upgrade() {
                    host.with_editor(|editor| editor.handle_focus());
                }
            }) as Box<dyn FnMut(web_sys::Event)>)
        };

        let blur = {
            let host = Rc::downgrade(host);
            Closure::wrap(Box::new(move |_event: web_sys::Event| {
                if let Some(host) = host.upgrade() {
                    host.with_editor(|editor| editor.handle_blur());
                }
            }) as Box<dyn FnMut(web_sys::Event)>)
        };

        let selection_change = {
            let host = Rc::downgrade(host);
            let selection = WebSelection::new(document.clone());
            Closure::wrap(Box::new(move |_event: web_sys::Event| {
                let Some(host) = host.upgrade() else {
                    return;
                };
                let native = selection.range();
                host.with_editor(|editor| editor.handle_selection_change(native.as_ref()));
            }) as Box<dyn FnMut(web_sys::Event)>)
        };

        let on_mutations = {
            let host = Rc::downgrade(host);
            Closure::wrap(Box::new(move |records: js_sys::Array, _observer: web_sys::MutationObserver| {
                let Some(host) = host.upgrade() else {
                    return;
                };
                let records: Vec<_> = records
                    .iter()
                    .filter_map(|record| record.dyn_into::<web_sys::MutationRecord>().ok())
                    .filter_map(|record| mutation_record(&record))
                    .collect();
                if records.is_empty() {
                    return;
                }
                host.with_editor(|editor| editor.handle_mutations(&records));
            }) as Box<dyn FnMut(js_sys::Array, web_sys::MutationObserver)>)
        };

        root.add_event_listener_with_callback("beforeinput", before_input.as_ref().unchecked_ref())?;
        root.add_event_listener_with_callback("focus", focus.as_ref().unchecked_ref())?;
        root.add_event_listener_with_callback("blur", blur.as_ref().unchecked_ref())?;
        document.add_event_listener_with_callback("selectionchange", selection_change.as_ref().unchecked_ref())?;

        let observer = web_sys::MutationObserver::new(on_mutations.as_ref().unchecked_ref())?;
        let init = web_sys::MutationObserverInit::new();
        init.set_child_list(true);
        init.set_character_data(true);
        init.set_subtree(true);
        observer.observe_with_options(root, &init)?;

        Ok(Self {
            root: root.clone(),
            document: document.clone(),
            before_input,
            focus,
            blur,
            selection_change,
            observer,
            _on_mutations: on_mutations,
        })
    }
}

impl Drop for Listeners {
    fn drop(&mut self) {
        self.observer.disconnect();
        let _ = self
            .root
            .remove_event_listener_with_callback("beforeinput", self.before_input.as_ref().unchecked_ref());
        let _ = self
            .root
            .remove_event_listener_with_callback("focus", self.focus.as_ref().unchecked_ref());
        let _ = self
            .root
            .remove_event_listener_with_callback("blur", self.blur.as_ref().unchecked_ref());
        let _ = self
            .document
            .remove_event_listener_with_callback("selectionchange", self.selection_change.as_ref().unchecked_ref());
    }
}
