use crate::{
    query::Document,
    store::{Namespace, NamespaceKey},
};
use std::collections::{BTreeMap, BTreeSet};

///
/// IndexGroup
///
/// Field paths sharing one index name. Paths are kept sorted, so the
/// compound key order never depends on declaration order.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndexGroup {
    pub name: String,
    pub fields: BTreeSet<String>,
    pub unique: bool,
    pub case_insensitive: bool,
    pub partial_filter: Option<Document>,
}

impl IndexGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

///
/// EntityDescriptor
///
/// Resolved, immutable naming and index metadata for one entity type
/// under one tenant namespace.
///

#[derive(Clone, Debug, PartialEq)]
pub struct EntityDescriptor {
    pub type_name: &'static str,
    pub namespace: Namespace,
    pub audit_collection: String,
    pub key_field: &'static str,
    pub indexes: BTreeMap<String, IndexGroup>,
    pub expiry_field: Option<String>,
    /// Geospatial index name to field name.
    pub geo_fields: BTreeMap<String, String>,
}

impl EntityDescriptor {
    #[must_use]
    pub fn database(&self) -> &str {
        &self.namespace.database
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.namespace.collection
    }

    #[must_use]
    pub fn namespace_key(&self) -> NamespaceKey {
        self.namespace.key()
    }

    /// Audit records live beside the entity, in the same database.
    #[must_use]
    pub fn audit_namespace(&self) -> Namespace {
        Namespace::new(self.namespace.database.clone(), self.audit_collection.clone())
    }
}
