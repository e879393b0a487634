use crate::model::index::{GeoMarker, IndexMarker};

///
/// ShapeModel
/// Ordered field list of an entity or nested composite.
///

#[derive(Debug)]
pub struct ShapeModel {
    pub name: &'static str,
    pub fields: &'static [FieldModel],
}

///
/// FieldModel
/// One declared field and the markers attached to it.
///

#[derive(Debug)]
pub struct FieldModel {
    /// Field name as stored in the document.
    pub name: &'static str,
    pub kind: FieldKind,
    /// Index markers in declaration order.
    pub indexes: &'static [IndexMarker],
    pub geo: Option<GeoMarker>,
    pub expire: bool,
}

impl FieldModel {
    /// Plain field with no markers.
    #[must_use]
    pub const fn plain(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            indexes: &[],
            geo: None,
            expire: false,
        }
    }
}

///
/// FieldKind
///

#[derive(Clone, Copy, Debug)]
pub enum FieldKind {
    /// Text value; trimmed before writes.
    Text,
    /// Any other scalar or opaque value.
    Value,
    /// Single nested composite.
    Nested(&'static ShapeModel),
    /// List of nested composites.
    NestedList(&'static ShapeModel),
}

impl FieldKind {
    #[must_use]
    pub const fn nested_shape(self) -> Option<&'static ShapeModel> {
        match self {
            Self::Nested(shape) | Self::NestedList(shape) => Some(shape),
            Self::Text | Self::Value => None,
        }
    }
}
