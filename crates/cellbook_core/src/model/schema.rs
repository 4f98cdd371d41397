//! Canonical interchange records for notebook cells.
//!
//! # Responsibility
//! - Define the wire shape cells are loaded from and saved to.
//! - Normalize tolerant input (missing fields, line-array source text).
//!
//! # Invariants
//! - `cell_type` is the discriminant; only code records carry
//!   `execution_count` and `outputs`.
//! - Missing `source`/`metadata`/`execution_count`/`outputs` default instead
//!   of failing deserialization.
//! - Serialized non-code records never contain code-only fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Immutable cell kind tag, fixed at model construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellType {
    /// Unrendered text passed through to the export format.
    Raw,
    /// Prose rendered as markdown.
    Markdown,
    /// Executable source with attached outputs.
    Code,
}

impl CellType {
    /// Returns the wire name for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Markdown => "markdown",
            Self::Code => "code",
        }
    }

    /// Returns the presentation mime hint fixed for this kind.
    pub fn default_mime_type(self) -> &'static str {
        match self {
            Self::Markdown => "text/markdown",
            Self::Raw | Self::Code => "text/plain",
        }
    }
}

impl Display for CellType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cell source text: either one joined string or a sequence of lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceText {
    /// Single string, used as-is.
    Joined(String),
    /// Line sequence, normalized by joining with `\n`.
    Lines(Vec<String>),
}

impl SourceText {
    /// Returns the normalized single-string form.
    pub fn to_joined(&self) -> String {
        match self {
            Self::Joined(text) => text.clone(),
            Self::Lines(lines) => lines.join("\n"),
        }
    }
}

impl Default for SourceText {
    fn default() -> Self {
        Self::Joined(String::new())
    }
}

impl From<&str> for SourceText {
    fn from(value: &str) -> Self {
        Self::Joined(value.to_string())
    }
}

impl From<String> for SourceText {
    fn from(value: String) -> Self {
        Self::Joined(value)
    }
}

/// One unit of execution result data attached to a code cell.
///
/// Only `output_type` is interpreted here; the remaining fields ride along
/// as opaque JSON so stream/display/error records all share one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    /// Record discriminant, e.g. `stream` or `execute_result`.
    pub output_type: String,
    /// Remaining record fields, passed through untouched.
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl OutputRecord {
    /// Creates a record with the given discriminant and no extra fields.
    pub fn new(output_type: impl Into<String>) -> Self {
        Self {
            output_type: output_type.into(),
            data: Map::new(),
        }
    }

    /// Adds one pass-through field, builder style.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Validates the record before it is admitted into an output collection.
    pub fn validate(&self) -> Result<(), OutputValidationError> {
        if self.output_type.trim().is_empty() {
            return Err(OutputValidationError::EmptyOutputType);
        }
        Ok(())
    }
}

/// Validation errors for output records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputValidationError {
    EmptyOutputType,
}

impl Display for OutputValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyOutputType => write!(f, "output record output_type must not be blank"),
        }
    }
}

impl Error for OutputValidationError {}

/// Canonical interchange record for one cell.
///
/// Tagged union over the cell kind: the discriminant field is `cell_type`
/// and only the `Code` variant carries execution state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cell_type", rename_all = "snake_case")]
pub enum CellData {
    Raw {
        /// Stable cell identity; generated on ingest when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default)]
        source: SourceText,
        #[serde(default)]
        metadata: Map<String, Value>,
    },
    Markdown {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default)]
        source: SourceText,
        #[serde(default)]
        metadata: Map<String, Value>,
    },
    Code {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default)]
        source: SourceText,
        #[serde(default)]
        metadata: Map<String, Value>,
        /// `None` means "not yet executed" and serializes as `null`.
        #[serde(default)]
        execution_count: Option<i64>,
        #[serde(default)]
        outputs: Vec<OutputRecord>,
    },
}

impl CellData {
    /// Returns the kind tag of this record.
    pub fn cell_type(&self) -> CellType {
        match self {
            Self::Raw { .. } => CellType::Raw,
            Self::Markdown { .. } => CellType::Markdown,
            Self::Code { .. } => CellType::Code,
        }
    }

    /// Returns the stable cell id when the record carries one.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Raw { id, .. } | Self::Markdown { id, .. } | Self::Code { id, .. } => {
                id.as_deref()
            }
        }
    }

    /// Returns the source text of this record.
    pub fn source(&self) -> &SourceText {
        match self {
            Self::Raw { source, .. }
            | Self::Markdown { source, .. }
            | Self::Code { source, .. } => source,
        }
    }

    /// Returns the metadata map of this record.
    pub fn metadata(&self) -> &Map<String, Value> {
        match self {
            Self::Raw { metadata, .. }
            | Self::Markdown { metadata, .. }
            | Self::Code { metadata, .. } => metadata,
        }
    }
}
