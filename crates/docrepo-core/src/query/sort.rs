use crate::query::{
    Document, QueryError, json_kind,
    path::{compare_values, values_at},
};
use serde_json::Value;
use std::{cmp::Ordering, fmt, str::FromStr};

///
/// SortDirection
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    #[must_use]
    pub const fn from_descending(descending: bool) -> Self {
        if descending {
            Self::Descending
        } else {
            Self::Ascending
        }
    }

    const fn as_i64(self) -> i64 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }
}

///
/// SortKey
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

///
/// Sort
///
/// Ordered list of sort keys; earlier keys take precedence.
/// Missing fields sort as null.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Sort {
    keys: Vec<SortKey>,
}

impl Sort {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self::default().then(field, SortDirection::Ascending)
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self::default().then(field, SortDirection::Descending)
    }

    #[must_use]
    pub fn then(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.keys.push(SortKey {
            field: field.into(),
            direction,
        });
        self
    }

    #[must_use]
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[must_use]
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for key in &self.keys {
            let left = sort_value(a, &key.field);
            let right = sort_value(b, &key.field);
            let ord = compare_values(left, right);
            let ord = match key.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }

        Ordering::Equal
    }

    /// Parse the JSON text form, e.g. `{"name": 1, "age": -1}`.
    pub fn parse(text: &str) -> Result<Self, QueryError> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(doc) = value else {
            return Err(QueryError::NotAnObject {
                found: json_kind(&value),
            });
        };

        Self::from_document(&doc)
    }

    pub fn from_document(doc: &Document) -> Result<Self, QueryError> {
        let mut sort = Self::default();
        for (field, direction) in doc {
            let direction = match direction.as_i64() {
                Some(1) => SortDirection::Ascending,
                Some(-1) => SortDirection::Descending,
                _ => {
                    return Err(QueryError::InvalidSortDirection {
                        field: field.clone(),
                    });
                }
            };
            sort = sort.then(field.clone(), direction);
        }

        Ok(sort)
    }

    #[must_use]
    pub fn to_document(&self) -> Document {
        self.keys
            .iter()
            .map(|key| (key.field.clone(), Value::from(key.direction.as_i64())))
            .collect()
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Object(self.to_document()))
    }
}

impl FromStr for Sort {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

static NULL: Value = Value::Null;

fn sort_value<'a>(doc: &'a Document, path: &str) -> &'a Value {
    values_at(doc, path).into_iter().next().unwrap_or(&NULL)
}
