use crate::model::{field::ShapeModel, index::FieldIndexModel};

///
/// EntityModel
/// Static, macro-generated (or hand-written) metadata for one entity type.
///

#[derive(Debug)]
pub struct EntityModel {
    /// Type name; default for both the database and the collection name.
    pub type_name: &'static str,
    /// Explicit database marker.
    pub database: Option<&'static str>,
    /// Explicit collection marker.
    pub collection: Option<&'static str>,
    /// Collection receiving audit records.
    pub audit_collection: Option<&'static str>,
    /// Document field holding the identifier.
    pub key_field: Option<&'static str>,
    pub shape: &'static ShapeModel,
    /// Class-level index markers, in declaration order.
    pub indexes: &'static [FieldIndexModel],
}

impl EntityModel {
    /// Field name as stored, matched case-insensitively against `name`.
    #[must_use]
    pub fn find_field(&self, name: &str) -> Option<&'static str> {
        self.shape
            .fields
            .iter()
            .find(|field| field.name.eq_ignore_ascii_case(name))
            .map(|field| field.name)
    }

    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.shape.fields.iter().any(|field| field.name == name)
    }
}
