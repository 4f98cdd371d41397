//! Synchronous change-notification channel.
//!
//! # Responsibility
//! - Provide the publish/subscribe primitive used by every observable model.
//! - Dispatch emissions synchronously, in connection order, with no queuing.
//!
//! # Invariants
//! - `emit` dispatches to a snapshot of the subscribers; handlers connected
//!   or disconnected during an emit take effect from the next emit.
//! - Handles cloned from the same signal share one subscriber list.
//! - Handlers that recursively mutate the field they react to are caller
//!   responsibility; the channel does not guard against that.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Identifier for one connected handler, used to disconnect it later.
pub type SlotId = u64;

struct Slot<T> {
    id: SlotId,
    handler: Rc<dyn Fn(&T)>,
}

struct SignalInner<T> {
    next_id: Cell<SlotId>,
    slots: RefCell<Vec<Slot<T>>>,
}

/// Single-threaded synchronous signal.
///
/// Cloning produces another handle to the same subscriber list, which lets
/// model constructors hand a re-emitting handle into collaborator handlers.
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Signal<T> {
    /// Creates a signal with no subscribers.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SignalInner {
                next_id: Cell::new(0),
                slots: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Connects a handler and returns its slot id.
    pub fn connect(&self, handler: impl Fn(&T) + 'static) -> SlotId {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.slots.borrow_mut().push(Slot {
            id,
            handler: Rc::new(handler),
        });
        id
    }

    /// Disconnects one handler by slot id.
    ///
    /// Returns `false` when the id is unknown or already disconnected.
    pub fn disconnect(&self, id: SlotId) -> bool {
        let mut slots = self.inner.slots.borrow_mut();
        let before = slots.len();
        slots.retain(|slot| slot.id != id);
        slots.len() != before
    }

    /// Emits one value to every currently connected handler.
    pub fn emit(&self, args: &T) {
        // Snapshot first so handlers can connect/disconnect re-entrantly.
        let snapshot: Vec<Rc<dyn Fn(&T)>> = self
            .inner
            .slots
            .borrow()
            .iter()
            .map(|slot| Rc::clone(&slot.handler))
            .collect();
        for handler in snapshot {
            handler(args);
        }
    }

    /// Returns the number of connected handlers.
    pub fn slot_count(&self) -> usize {
        self.inner.slots.borrow().len()
    }
}
