//! Editor-model text buffer owned by each cell.
//!
//! # Responsibility
//! - Store the cell's text and presentation mime hint.
//! - Emit one change event per effective text mutation.
//!
//! # Invariants
//! - Setting equal text emits nothing.
//! - After `dispose`, mutations are no-ops.

use crate::signal::Signal;
use std::cell::{Cell, RefCell};

/// Mutable text storage with a change signal, exclusively owned by one cell.
pub struct TextBuffer {
    text: RefCell<String>,
    mime_type: RefCell<String>,
    changed: Signal<()>,
    disposed: Cell<bool>,
}

impl TextBuffer {
    /// Creates an empty buffer with the given mime hint.
    pub fn new(mime_type: impl Into<String>) -> Self {
        Self {
            text: RefCell::new(String::new()),
            mime_type: RefCell::new(mime_type.into()),
            changed: Signal::new(),
            disposed: Cell::new(false),
        }
    }

    /// Returns a clone of the buffer text.
    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }

    /// Replaces the buffer text, emitting one change event on effective change.
    pub fn set_text(&self, text: impl Into<String>) {
        if self.disposed.get() {
            return;
        }
        let text = text.into();
        if *self.text.borrow() == text {
            return;
        }
        *self.text.borrow_mut() = text;
        self.changed.emit(&());
    }

    /// Returns the presentation mime hint.
    pub fn mime_type(&self) -> String {
        self.mime_type.borrow().clone()
    }

    /// Replaces the mime hint. Informational only; emits nothing.
    pub fn set_mime_type(&self, mime_type: impl Into<String>) {
        if self.disposed.get() {
            return;
        }
        *self.mime_type.borrow_mut() = mime_type.into();
    }

    /// Returns the text-change signal.
    pub fn changed(&self) -> &Signal<()> {
        &self.changed
    }

    /// Releases the buffer. Idempotent.
    pub fn dispose(&self) {
        self.disposed.set(true);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

#[cfg(test)]
mod tests {
    use super::TextBuffer;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn set_text_emits_only_on_effective_change() {
        let buffer = TextBuffer::new("text/plain");
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        buffer.changed().connect(move |_| counter.set(counter.get() + 1));

        buffer.set_text("x = 1");
        buffer.set_text("x = 1");
        buffer.set_text("x = 2");

        assert_eq!(hits.get(), 2);
        assert_eq!(buffer.text(), "x = 2");
    }

    #[test]
    fn disposed_buffer_ignores_mutation() {
        let buffer = TextBuffer::new("text/markdown");
        buffer.set_text("# title");
        buffer.dispose();
        buffer.dispose();

        buffer.set_text("replaced");
        buffer.set_mime_type("text/plain");

        assert!(buffer.is_disposed());
        assert_eq!(buffer.text(), "# title");
        assert_eq!(buffer.mime_type(), "text/markdown");
    }
}
