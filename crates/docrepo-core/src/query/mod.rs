//! Module: query
//! Responsibility: structured and text-form filters, sorts, and update documents.
//! Does not own: execution; engines interpret these values behind the store port.
//! Boundary: everything a repository hands to a collection handle.

mod filter;
mod path;
mod sort;
mod update;


pub use filter::Filter;
pub use path::{compare_values, get_path, set_path, values_at, values_equal};
pub use sort::{Sort, SortDirection, SortKey};
pub use update::UpdateDocument;

use thiserror::Error as ThisError;

/// A stored document: an ordered JSON object.
pub type Document = serde_json::Map<String, serde_json::Value>;

///
/// QueryError
///
/// Raised when a text-form filter or sort cannot be interpreted.
///

#[derive(Debug, ThisError)]
pub enum QueryError {
    #[error("query text is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    #[error("unsupported operator '{operator}' on field '{field}'")]
    UnsupportedOperator { field: String, operator: String },

    #[error("operator '{operator}' expects {expected}")]
    InvalidOperand {
        operator: String,
        expected: &'static str,
    },

    #[error("sort direction for '{field}' must be 1 or -1")]
    InvalidSortDirection { field: String },

    #[error("unknown field '{field}' for entity '{entity}'")]
    UnknownField { entity: &'static str, field: String },
}

pub(crate) const fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
