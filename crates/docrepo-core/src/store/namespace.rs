use derive_more::{Deref, Display};
use std::fmt;

///
/// Namespace
///
/// Resolved database + collection pair.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }

    /// Deduplication key used for provisioning: `{collection}@{database}`.
    #[must_use]
    pub fn key(&self) -> NamespaceKey {
        NamespaceKey(format!("{}@{}", self.collection, self.database))
    }

    /// Qualified name: `{database}.{collection}`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.database, self.collection)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

///
/// NamespaceKey
///

#[derive(Clone, Debug, Deref, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NamespaceKey(String);

impl NamespaceKey {
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}
