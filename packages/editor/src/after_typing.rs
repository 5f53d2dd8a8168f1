//! # afterTyping
//!
//! When the browser is allowed to apply an edit natively, the DOM only holds
//! the result after the current event turn. The interceptor records what it
//! let through as an [`AfterTyping`] continuation; the queue asks the
//! [`FrameScheduler`] for the next animation frame and hands all due
//! continuations back, in registration order, when that frame arrives.

use folio_model::{Path, Selection};
use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::trace;

/// Requests a callback on the next animation frame.
///
/// The owner calls [`crate::Editor::on_animation_frame`] when it fires. Extra
/// requests before the frame arrives may be coalesced.
pub trait FrameScheduler {
    fn request_frame(&mut self);
}

/// A native edit waiting for its DOM result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AfterTyping {
    /// `data` was typed at the collapsed `caret` in the run at `text_path`
    InsertText { data: String, caret: Selection, text_path: Path },
    /// The browser replaced a word in the run at `text_path`
    ReplacementText { text_path: Path },
    /// A native single-run deletion; `caret` is where it leaves the caret
    Resync { text_path: Path, caret: Selection },
}

impl AfterTyping {
    /// The run whose DOM text this continuation reads or changes
    pub fn text_path(&self) -> &Path {
        match self {
            AfterTyping::InsertText { text_path, .. }
            | AfterTyping::ReplacementText { text_path }
            | AfterTyping::Resync { text_path, .. } => text_path,
        }
    }
}

#[derive(Debug, Default)]
pub struct AfterTypingQueue {
    pending: VecDeque<AfterTyping>,
    frame_requested: bool,
}

impl AfterTypingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, continuation: AfterTyping, scheduler: &mut dyn FrameScheduler) {
        trace!(path = %continuation.text_path(), pending = self.pending.len(), "afterTyping enqueue");
        self.pending.push_back(continuation);
        if !self.frame_requested {
            self.frame_requested = true;
            scheduler.request_frame();
        }
    }

    /// Take every pending continuation, oldest first.
    pub fn drain(&mut self) -> Vec<AfterTyping> {
        self.frame_requested = false;
        trace!(count = self.pending.len(), "afterTyping drain");
        self.pending.drain(..).collect()
    }

    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Scheduler driven by hand, for tests and headless hosts.
///
/// Clones share the same request counter.
#[derive(Debug, Clone, Default)]
pub struct ManualFrames {
    requested: Rc<Cell<usize>>,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames requested and not yet taken
    pub fn requested(&self) -> usize {
        self.requested.get()
    }

    /// Consume one outstanding request, if any.
    pub fn take(&self) -> bool {
        let count = self.requested.get();
        if count == 0 {
            return false;
        }
        self.requested.set(count - 1);
        true
    }
}

impl FrameScheduler for ManualFrames {
    fn request_frame(&mut self) {
        self.requested.set(self.requested.get() + 1);
    }
}
