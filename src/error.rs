//! Structured error types for the Trellis composition engine.
//!
//! Three variants cover the real error sources: JSON parsing of table
//! descriptions, structural content errors, and placement failures on the
//! strict insertion path. Invariant violations inside the merge are bugs in
//! the engine itself and panic instead of surfacing here.

use std::fmt;

/// The unified error type returned by all public Trellis API functions.
#[derive(Debug)]
pub enum TrellisError {
    /// JSON input failed to parse as a valid table description.
    ParseError {
        source: serde_json::Error,
        hint: String,
    },
    /// A content element or table parameter was structurally invalid
    /// (zero columns, wrong widths length, disallowed element kind).
    BadElement(String),
    /// A cell could not be placed: its span rectangle leaves the matrix or
    /// overlaps an existing reservation. Raised only on the strict
    /// explicit-location path; the cursor convenience path swallows it.
    Placement {
        row: usize,
        column: usize,
        rowspan: usize,
        colspan: usize,
    },
}

impl fmt::Display for TrellisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrellisError::ParseError { source, hint } => {
                write!(f, "Failed to parse table description: {}", source)?;
                if !hint.is_empty() {
                    write!(f, "\n  Hint: {}", hint)?;
                }
                Ok(())
            }
            TrellisError::BadElement(msg) => write!(f, "Bad element: {}", msg),
            TrellisError::Placement {
                row,
                column,
                rowspan,
                colspan,
            } => write!(
                f,
                "Cannot place cell at ({}, {}) with rowspan {} and colspan {}: beyond boundaries or overlapping",
                row, column, rowspan, colspan
            ),
        }
    }
}

impl std::error::Error for TrellisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrellisError::ParseError { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TrellisError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the table description schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input — is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        TrellisError::ParseError { source: e, hint }
    }
}
