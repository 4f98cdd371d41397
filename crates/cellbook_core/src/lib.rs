//! Core data model for notebook cells.
//! This crate is the single source of truth for cell metadata, trust, and
//! serialization invariants; rendering and document ownership live upstream.

pub mod logging;
pub mod model;
pub mod signal;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::buffer::TextBuffer;
pub use model::cell::{
    CellModel, StateChange, COLLAPSED_KEY, FORMAT_KEY, SCROLLED_KEY, TRUSTED_KEY,
};
pub use model::metadata::{MetadataChange, MetadataChangeKind, MetadataContainer};
pub use model::outputs::{
    DefaultOutputAreaFactory, OutputAreaError, OutputAreaFactory, OutputAreaModel,
    OutputAreaOptions,
};
pub use model::schema::{CellData, CellType, OutputRecord, OutputValidationError, SourceText};
pub use signal::{Signal, SlotId};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
