//! Notebook cell domain model.
//!
//! # Responsibility
//! - Define the cell model, its owned collaborators, and the interchange
//!   records they load from and save to.
//!
//! # Invariants
//! - Every sub-model is exclusively owned by one cell; no two cells share
//!   a buffer, metadata container, or output collection.
//! - All change notification is synchronous.

pub mod buffer;
pub mod cell;
pub mod metadata;
pub mod outputs;
pub mod schema;
