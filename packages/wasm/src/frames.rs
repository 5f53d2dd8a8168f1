use crate::host::Host;
use folio_editor::FrameScheduler;
use std::rc::Weak;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// Schedules afterTyping drains with `requestAnimationFrame`.
pub struct AnimationFrames {
    host: Weak<Host>,
}

impl AnimationFrames {
    pub fn new(host: Weak<Host>) -> Self {
        Self { host }
    }
}

impl FrameScheduler for AnimationFrames {
    fn request_frame(&mut self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let host = self.host.clone();
        let closure = Closure::once(move || {
            if let Some(host) = host.upgrade() {
                host.with_editor(|editor| editor.on_animation_frame());
            }
        });
        if let Err(err) = window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            tracing::warn!(error = ?err, "requestAnimationFrame failed");
        }
        closure.forget();
    }
}
