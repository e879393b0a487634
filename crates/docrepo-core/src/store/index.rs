use crate::query::Document;
use std::time::Duration;

///
/// IndexKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndexKind {
    Ascending,
    Sphere2d,
}

///
/// IndexKey
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexKey {
    pub field: String,
    pub kind: IndexKind,
}

///
/// Collation
///
/// Strength 2 (secondary) compares case-insensitively.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Collation {
    pub locale: String,
    pub strength: u8,
}

impl Collation {
    #[must_use]
    pub fn case_insensitive() -> Self {
        Self {
            locale: "en".to_string(),
            strength: 2,
        }
    }

    #[must_use]
    pub const fn is_case_insensitive(&self) -> bool {
        self.strength <= 2
    }
}

///
/// IndexRequest
///
/// One index-creation command, as submitted to a collection.
///

#[derive(Clone, Debug, PartialEq)]
pub struct IndexRequest {
    pub name: String,
    pub keys: Vec<IndexKey>,
    pub unique: bool,
    pub collation: Option<Collation>,
    pub partial_filter: Option<Document>,
    pub expire_after: Option<Duration>,
}

impl IndexRequest {
    /// Ascending compound index over `fields`, in the given order.
    pub fn ascending<I, S>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            keys: fields
                .into_iter()
                .map(|field| IndexKey {
                    field: field.into(),
                    kind: IndexKind::Ascending,
                })
                .collect(),
            unique: false,
            collation: None,
            partial_filter: None,
            expire_after: None,
        }
    }

    pub fn sphere_2d(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            keys: vec![IndexKey {
                field: field.into(),
                kind: IndexKind::Sphere2d,
            }],
            ..Self::ascending(name, std::iter::empty::<String>())
        }
    }

    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        self.keys.iter().map(|k| k.field.as_str()).collect()
    }

    /// Whether two requests describe the same index, ignoring the name.
    #[must_use]
    pub fn same_definition(&self, other: &Self) -> bool {
        self.keys == other.keys
            && self.unique == other.unique
            && self.collation == other.collation
            && self.partial_filter == other.partial_filter
            && self.expire_after == other.expire_after
    }
}
