//! Execution-output collection model and its construction factory.
//!
//! # Responsibility
//! - Hold the ordered output records of one code cell.
//! - Track the collection-level trust flag the owning cell cascades into.
//! - Let hosts substitute an alternate collection implementation source via
//!   the factory seam.
//!
//! # Invariants
//! - Records are validated before admission; order is append order.
//! - `set_trusted` with an equal value emits nothing; an effective flip
//!   emits one collection-changed event.
//! - Dispose is idempotent; afterwards fallible mutators return `Disposed`
//!   and infallible setters are no-ops.

use crate::model::schema::{OutputRecord, OutputValidationError};
use crate::signal::Signal;
use std::cell::{Cell, RefCell};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

/// Errors for output collection mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputAreaError {
    /// Record failed admission validation.
    Validation(OutputValidationError),
    /// Item index does not exist in the collection.
    IndexOutOfRange { index: usize, len: usize },
    /// The collection was disposed and no longer accepts mutation.
    Disposed,
}

impl Display for OutputAreaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "output index {index} out of range for length {len}")
            }
            Self::Disposed => write!(f, "output collection is disposed"),
        }
    }
}

impl Error for OutputAreaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<OutputValidationError> for OutputAreaError {
    fn from(value: OutputValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Construction options for one output collection.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputAreaOptions {
    /// Initial trust flag, taken from the owning cell's trusted value.
    pub trusted: bool,
}

struct OutputAreaInner {
    trusted: Cell<bool>,
    items: RefCell<Vec<OutputRecord>>,
    list_changed: Signal<()>,
    item_changed: Signal<usize>,
    disposed: Cell<bool>,
}

/// Ordered output collection for one code cell.
///
/// Cloning produces another handle to the same collection, which is how the
/// owning cell's trust-cascade handler keeps a reference into it.
pub struct OutputAreaModel {
    inner: Rc<OutputAreaInner>,
}

impl Clone for OutputAreaModel {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl OutputAreaModel {
    /// Creates an empty collection with the given options.
    pub fn new(options: OutputAreaOptions) -> Self {
        Self {
            inner: Rc::new(OutputAreaInner {
                trusted: Cell::new(options.trusted),
                items: RefCell::new(Vec::new()),
                list_changed: Signal::new(),
                item_changed: Signal::new(),
                disposed: Cell::new(false),
            }),
        }
    }

    /// Returns the collection trust flag.
    pub fn trusted(&self) -> bool {
        self.inner.trusted.get()
    }

    /// Sets the collection trust flag.
    ///
    /// An effective flip re-trusts or un-trusts every stored record at once,
    /// so it emits one collection-changed event.
    pub fn set_trusted(&self, trusted: bool) {
        if self.inner.disposed.get() || self.inner.trusted.get() == trusted {
            return;
        }
        self.inner.trusted.set(trusted);
        self.inner.list_changed.emit(&());
    }

    /// Appends one validated record and returns its index.
    pub fn add(&self, record: OutputRecord) -> Result<usize, OutputAreaError> {
        if self.inner.disposed.get() {
            return Err(OutputAreaError::Disposed);
        }
        record.validate()?;
        let index = {
            let mut items = self.inner.items.borrow_mut();
            items.push(record);
            items.len() - 1
        };
        self.inner.list_changed.emit(&());
        Ok(index)
    }

    /// Replaces the record at `index` with a validated record.
    pub fn set(&self, index: usize, record: OutputRecord) -> Result<(), OutputAreaError> {
        if self.inner.disposed.get() {
            return Err(OutputAreaError::Disposed);
        }
        record.validate()?;
        {
            let mut items = self.inner.items.borrow_mut();
            let len = items.len();
            let slot = items
                .get_mut(index)
                .ok_or(OutputAreaError::IndexOutOfRange { index, len })?;
            *slot = record;
        }
        self.inner.item_changed.emit(&index);
        Ok(())
    }

    /// Removes every record. Emits one collection-changed event when the
    /// collection was non-empty.
    pub fn clear(&self) {
        if self.inner.disposed.get() {
            return;
        }
        let was_empty = {
            let mut items = self.inner.items.borrow_mut();
            let was_empty = items.is_empty();
            items.clear();
            was_empty
        };
        if !was_empty {
            self.inner.list_changed.emit(&());
        }
    }

    /// Returns a clone of the record at `index`.
    pub fn get(&self, index: usize) -> Option<OutputRecord> {
        self.inner.items.borrow().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    /// Returns the collection-changed signal (append, clear, trust flip).
    pub fn list_changed(&self) -> &Signal<()> {
        &self.inner.list_changed
    }

    /// Returns the item-changed signal, carrying the replaced index.
    pub fn item_changed(&self) -> &Signal<usize> {
        &self.inner.item_changed
    }

    /// Returns a copy of the stored records for serialization.
    pub fn to_records(&self) -> Vec<OutputRecord> {
        self.inner.items.borrow().clone()
    }

    /// Releases the collection. Idempotent; clears all records silently.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        self.inner.items.borrow_mut().clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }
}

/// Construction seam for output collections.
///
/// Hosts that render outputs through their own collection implementation
/// inject a factory; everything else uses [`DefaultOutputAreaFactory`].
pub trait OutputAreaFactory {
    fn create_output_area(&self, options: OutputAreaOptions) -> OutputAreaModel;
}

/// Default factory producing plain in-memory collections.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOutputAreaFactory;

impl OutputAreaFactory for DefaultOutputAreaFactory {
    fn create_output_area(&self, options: OutputAreaOptions) -> OutputAreaModel {
        OutputAreaModel::new(options)
    }
}

#[cfg(test)]
mod tests {
    use super::{OutputAreaError, OutputAreaModel, OutputAreaOptions};
    use crate::model::schema::{OutputRecord, OutputValidationError};
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    fn stream_record(text: &str) -> OutputRecord {
        OutputRecord::new("stream")
            .with_field("name", json!("stdout"))
            .with_field("text", json!(text))
    }

    #[test]
    fn add_appends_in_order_and_emits_list_changed() {
        let outputs = OutputAreaModel::new(OutputAreaOptions::default());
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        outputs
            .list_changed()
            .connect(move |_| counter.set(counter.get() + 1));

        assert_eq!(outputs.add(stream_record("1")).expect("first add"), 0);
        assert_eq!(outputs.add(stream_record("2")).expect("second add"), 1);

        assert_eq!(outputs.len(), 2);
        assert_eq!(hits.get(), 2);
        assert_eq!(outputs.get(1).expect("second record").data["text"], "2");
    }

    #[test]
    fn add_rejects_invalid_record() {
        let outputs = OutputAreaModel::new(OutputAreaOptions::default());
        let err = outputs
            .add(OutputRecord::new(""))
            .expect_err("blank output_type must be rejected");
        assert_eq!(
            err,
            OutputAreaError::Validation(OutputValidationError::EmptyOutputType)
        );
        assert!(outputs.is_empty());
    }

    #[test]
    fn set_replaces_one_item_and_emits_its_index() {
        let outputs = OutputAreaModel::new(OutputAreaOptions::default());
        outputs.add(stream_record("a")).expect("seed record");
        outputs.add(stream_record("b")).expect("seed record");

        let seen = Rc::new(Cell::new(None));
        let sink = Rc::clone(&seen);
        outputs.item_changed().connect(move |index| sink.set(Some(*index)));

        outputs.set(1, stream_record("b2")).expect("replace");
        assert_eq!(seen.get(), Some(1));
        assert_eq!(outputs.get(1).expect("replaced record").data["text"], "b2");

        let err = outputs
            .set(5, stream_record("x"))
            .expect_err("out-of-range index must fail");
        assert_eq!(err, OutputAreaError::IndexOutOfRange { index: 5, len: 2 });
    }

    #[test]
    fn set_trusted_flip_emits_once_and_equal_value_is_silent() {
        let outputs = OutputAreaModel::new(OutputAreaOptions { trusted: false });
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        outputs
            .list_changed()
            .connect(move |_| counter.set(counter.get() + 1));

        outputs.set_trusted(false);
        assert_eq!(hits.get(), 0);

        outputs.set_trusted(true);
        assert!(outputs.trusted());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn clear_emits_only_when_non_empty() {
        let outputs = OutputAreaModel::new(OutputAreaOptions::default());
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        outputs
            .list_changed()
            .connect(move |_| counter.set(counter.get() + 1));

        outputs.clear();
        assert_eq!(hits.get(), 0);

        outputs.add(stream_record("1")).expect("seed record");
        outputs.clear();
        assert!(outputs.is_empty());
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn dispose_is_idempotent_and_blocks_mutation() {
        let outputs = OutputAreaModel::new(OutputAreaOptions { trusted: true });
        outputs.add(stream_record("1")).expect("seed record");

        outputs.dispose();
        outputs.dispose();

        assert!(outputs.is_disposed());
        assert!(outputs.is_empty());
        assert_eq!(
            outputs.add(stream_record("2")),
            Err(OutputAreaError::Disposed)
        );
        assert_eq!(
            outputs.set(0, stream_record("2")),
            Err(OutputAreaError::Disposed)
        );
        outputs.set_trusted(false);
        assert!(outputs.trusted());
    }
}
