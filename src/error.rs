//! Error types for table decoding.
//!
//! These cover the conditions that are fatal for the document being decoded.
//! Row-level conditions (a required field missing from one row, or a
//! carry-forward with no prior value) are not errors; the extractor drops the
//! row and keeps going, see [`crate::extract::ExtractStats`].

use std::fmt;

/// A condition that aborts decoding of the current table document.
///
/// Other documents from the same capture are unaffected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// A `ref` field points at an id that no earlier field in the document
    /// defined. The export is malformed or out of order.
    DanglingReference {
        schema: String,
        row: usize,
        id: String,
    },
    /// The document's schema name is not the one the caller asked to decode.
    SchemaMismatch { expected: String, found: String },
    /// A resolved field's text does not parse as the expected numeric type.
    /// Indicates a schema mismatch or a corrupted export; never coerced.
    MalformedNumber {
        schema: String,
        field: String,
        value: String,
    },
    /// A start-time value does not have the expected `MM:SS[.fraction]` shape.
    MalformedTimestamp { value: String },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::DanglingReference { schema, row, id } => {
                write!(f, "{schema} row {row}: reference to unseen id '{id}'")
            }
            TableError::SchemaMismatch { expected, found } => {
                write!(f, "expected schema '{expected}', document is '{found}'")
            }
            TableError::MalformedNumber {
                schema,
                field,
                value,
            } => {
                write!(f, "{schema}.{field}: cannot parse '{value}' as a number")
            }
            TableError::MalformedTimestamp { value } => {
                write!(f, "cannot parse '{value}' as a MM:SS timestamp")
            }
        }
    }
}

impl std::error::Error for TableError {}
