//! Notebook cell model.
//!
//! # Responsibility
//! - Own one cell's text buffer, metadata container, and (for code cells)
//!   output collection.
//! - Normalize interchange input at construction and serialize back out
//!   with full fidelity.
//! - Fan collaborator change events into the cell's two signal channels.
//!
//! # Invariants
//! - The kind tag is fixed at construction and never reassigned.
//! - Non-raw cells never ingest a `format` metadata key; non-code cells
//!   never ingest `collapsed`/`scrolled`. Stripping happens once, on
//!   ingest only.
//! - For code cells, `outputs.trusted` always equals the cell's derived
//!   trusted value; the cascade is re-asserted on every metadata change.
//! - Dispose is idempotent for every variant; afterwards all setters are
//!   no-ops.

use crate::model::buffer::TextBuffer;
use crate::model::metadata::MetadataContainer;
use crate::model::outputs::{
    DefaultOutputAreaFactory, OutputAreaFactory, OutputAreaModel, OutputAreaOptions,
};
use crate::model::schema::{CellData, CellType, SourceText};
use crate::signal::Signal;
use log::{debug, warn};
use serde_json::Value;
use std::cell::Cell;
use uuid::Uuid;

/// Metadata key holding the provenance trust flag.
pub const TRUSTED_KEY: &str = "trusted";
/// Metadata key meaningful for raw cells only.
pub const FORMAT_KEY: &str = "format";
/// Metadata key meaningful for code cells only.
pub const COLLAPSED_KEY: &str = "collapsed";
/// Metadata key meaningful for code cells only.
pub const SCROLLED_KEY: &str = "scrolled";

/// Payload for one named state transition.
#[derive(Debug, Clone, PartialEq)]
pub struct StateChange {
    /// Transition name, e.g. `trusted` or `execution_count`.
    pub name: &'static str,
    pub old_value: Value,
    pub new_value: Value,
}

struct CodeState {
    execution_count: Cell<Option<i64>>,
    outputs: OutputAreaModel,
}

enum CellVariant {
    Raw,
    Markdown,
    Code(CodeState),
}

/// Model for one notebook cell.
///
/// One struct covers all three kinds; the kind tag is the discriminant and
/// only code cells carry execution state. Dispatch is pattern matching on
/// the private variant payload.
pub struct CellModel {
    kind: CellType,
    id: String,
    buffer: TextBuffer,
    metadata: MetadataContainer,
    content_changed: Signal<()>,
    state_changed: Signal<StateChange>,
    disposed: Cell<bool>,
    variant: CellVariant,
}

impl CellModel {
    /// Creates a raw cell, optionally seeded from interchange data.
    pub fn raw(data: Option<&CellData>) -> Self {
        Self::build(CellType::Raw, data, &DefaultOutputAreaFactory)
    }

    /// Creates a markdown cell, optionally seeded from interchange data.
    pub fn markdown(data: Option<&CellData>) -> Self {
        Self::build(CellType::Markdown, data, &DefaultOutputAreaFactory)
    }

    /// Creates a code cell using the default output collection factory.
    pub fn code(data: Option<&CellData>) -> Self {
        Self::build(CellType::Code, data, &DefaultOutputAreaFactory)
    }

    /// Creates a code cell with a caller-supplied output collection factory.
    pub fn code_with_factory(data: Option<&CellData>, factory: &dyn OutputAreaFactory) -> Self {
        Self::build(CellType::Code, data, factory)
    }

    /// Creates a cell of the kind named by the record's own tag.
    pub fn from_data(data: &CellData) -> Self {
        Self::build(data.cell_type(), Some(data), &DefaultOutputAreaFactory)
    }

    /// Creates a cell from a record, injecting an output collection factory.
    ///
    /// The factory only matters when the record's tag is `code`.
    pub fn from_data_with_factory(data: &CellData, factory: &dyn OutputAreaFactory) -> Self {
        Self::build(data.cell_type(), Some(data), factory)
    }

    fn build(kind: CellType, data: Option<&CellData>, factory: &dyn OutputAreaFactory) -> Self {
        let id = data
            .and_then(CellData::id)
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        // Seed text and metadata before any handler is connected, so ingest
        // produces no change events.
        let buffer = TextBuffer::new(kind.default_mime_type());
        if let Some(record) = data {
            buffer.set_text(record.source().to_joined());
        }

        let metadata = MetadataContainer::new();
        if let Some(record) = data {
            for (key, value) in record.metadata() {
                if is_stripped_key(kind, key) {
                    debug!(
                        "event=metadata_key_stripped module=model cell_type={kind} key={key}"
                    );
                    continue;
                }
                metadata.set(key, value.clone());
            }
        }

        let content_changed: Signal<()> = Signal::new();
        let state_changed: Signal<StateChange> = Signal::new();

        {
            let content = content_changed.clone();
            buffer.changed().connect(move |_| content.emit(&()));
        }
        {
            let content = content_changed.clone();
            metadata.changed().connect(move |_| content.emit(&()));
        }

        let variant = match kind {
            CellType::Raw => CellVariant::Raw,
            CellType::Markdown => CellVariant::Markdown,
            CellType::Code => {
                let trusted = metadata
                    .get(TRUSTED_KEY)
                    .map(|value| json_truthy(&value))
                    .unwrap_or(false);
                let outputs = factory.create_output_area(OutputAreaOptions { trusted });

                let mut execution_count = None;
                if let Some(CellData::Code {
                    execution_count: seed_count,
                    outputs: seed_records,
                    ..
                }) = data
                {
                    execution_count = *seed_count;
                    for record in seed_records {
                        if let Err(err) = outputs.add(record.clone()) {
                            warn!(
                                "event=output_record_skipped module=model reason={err}"
                            );
                        }
                    }
                }

                {
                    let content = content_changed.clone();
                    outputs.list_changed().connect(move |_| content.emit(&()));
                }
                {
                    let content = content_changed.clone();
                    outputs.item_changed().connect(move |_| content.emit(&()));
                }
                {
                    // Trust cascade: the collection flag tracks the metadata
                    // key for the cell's whole lifetime, not just construction.
                    let outputs = outputs.clone();
                    metadata.changed().connect(move |change| {
                        if change.key == TRUSTED_KEY {
                            let trusted = change
                                .new_value
                                .as_ref()
                                .map(json_truthy)
                                .unwrap_or(false);
                            outputs.set_trusted(trusted);
                        }
                    });
                }

                CellVariant::Code(CodeState {
                    execution_count: Cell::new(execution_count),
                    outputs,
                })
            }
        };

        Self {
            kind,
            id,
            buffer,
            metadata,
            content_changed,
            state_changed,
            disposed: Cell::new(false),
            variant,
        }
    }

    /// Returns the fixed kind tag.
    pub fn cell_type(&self) -> CellType {
        self.kind
    }

    /// Returns the stable cell id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns a clone of the cell text.
    pub fn text(&self) -> String {
        self.buffer.text()
    }

    /// Replaces the cell text through the owned buffer.
    pub fn set_text(&self, text: impl Into<String>) {
        if self.disposed.get() {
            return;
        }
        self.buffer.set_text(text);
    }

    /// Returns the owned text buffer.
    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    /// Returns the owned metadata container. Callers mutate it directly;
    /// mutations propagate into `content_changed`.
    pub fn metadata(&self) -> &MetadataContainer {
        &self.metadata
    }

    /// Returns the derived trust flag: the truthiness of the `trusted`
    /// metadata key. Not independently stored.
    pub fn trusted(&self) -> bool {
        self.metadata
            .get(TRUSTED_KEY)
            .map(|value| json_truthy(&value))
            .unwrap_or(false)
    }

    /// Sets the trust flag through metadata.
    ///
    /// No-op on an equal value; otherwise writes the metadata key (which
    /// synchronously drives `content_changed` and, for code cells, the
    /// outputs cascade) and then emits one `trusted` state change.
    pub fn set_trusted(&self, trusted: bool) {
        if self.disposed.get() {
            return;
        }
        let old = self.trusted();
        if old == trusted {
            return;
        }
        self.metadata.set(TRUSTED_KEY, Value::Bool(trusted));
        self.state_changed.emit(&StateChange {
            name: "trusted",
            old_value: Value::Bool(old),
            new_value: Value::Bool(trusted),
        });
    }

    /// Returns the execution count. `None` for cells never executed and for
    /// non-code cells.
    pub fn execution_count(&self) -> Option<i64> {
        match &self.variant {
            CellVariant::Code(state) => state.execution_count.get(),
            _ => None,
        }
    }

    /// Sets the execution count of a code cell.
    ///
    /// No-op on an equal value or a non-code cell. `Some(0)` is a
    /// legitimate count and is preserved, never coerced to `None`. Emits
    /// `content_changed` then one `execution_count` state change.
    pub fn set_execution_count(&self, value: Option<i64>) {
        if self.disposed.get() {
            return;
        }
        let CellVariant::Code(state) = &self.variant else {
            return;
        };
        let old = state.execution_count.get();
        if old == value {
            return;
        }
        state.execution_count.set(value);
        self.content_changed.emit(&());
        self.state_changed.emit(&StateChange {
            name: "execution_count",
            old_value: count_to_value(old),
            new_value: count_to_value(value),
        });
    }

    /// Returns the owned output collection for code cells.
    pub fn outputs(&self) -> Option<&OutputAreaModel> {
        match &self.variant {
            CellVariant::Code(state) => Some(&state.outputs),
            _ => None,
        }
    }

    /// Returns the signal fired on every text, metadata, or output change.
    pub fn content_changed(&self) -> &Signal<()> {
        &self.content_changed
    }

    /// Returns the signal fired on named state transitions.
    pub fn state_changed(&self) -> &Signal<StateChange> {
        &self.state_changed
    }

    /// Serializes the cell into its canonical interchange record.
    ///
    /// Metadata is a structural copy of the stored JSON values; code cells
    /// add the execution count (value or null) and the output collection's
    /// own serialization.
    pub fn to_data(&self) -> CellData {
        let id = Some(self.id.clone());
        let source = SourceText::from(self.buffer.text());
        let metadata = self.metadata.to_map();
        match &self.variant {
            CellVariant::Raw => CellData::Raw {
                id,
                source,
                metadata,
            },
            CellVariant::Markdown => CellData::Markdown {
                id,
                source,
                metadata,
            },
            CellVariant::Code(state) => CellData::Code {
                id,
                source,
                metadata,
                execution_count: state.execution_count.get(),
                outputs: state.outputs.to_records(),
            },
        }
    }

    /// Releases the cell and its owned sub-models. Idempotent for every
    /// variant; after disposal all setters are no-ops.
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        if let CellVariant::Code(state) = &self.variant {
            state.outputs.dispose();
        }
        self.metadata.dispose();
        self.buffer.dispose();
        debug!(
            "event=cell_disposed module=model cell_type={} id={}",
            self.kind, self.id
        );
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

/// Returns whether `key` must be stripped from ingested metadata for `kind`.
fn is_stripped_key(kind: CellType, key: &str) -> bool {
    match key {
        FORMAT_KEY => kind != CellType::Raw,
        COLLAPSED_KEY | SCROLLED_KEY => kind != CellType::Code,
        _ => false,
    }
}

/// JSON truthiness: null, false, zero, and the empty string are falsy;
/// everything else, including empty arrays and objects, is truthy.
fn json_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn count_to_value(count: Option<i64>) -> Value {
    match count {
        Some(value) => Value::from(value),
        None => Value::Null,
    }
}
