use std::fmt::{self, Display};

///
/// IndexMarker
/// Field-level index declaration. Fields sharing a name form one index.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct IndexMarker {
    /// Group name; the field path is used when absent.
    pub name: Option<&'static str>,
    pub unique: bool,
    pub case_insensitive: bool,
    /// JSON text of a partial-filter expression.
    pub partial_filter: Option<&'static str>,
}

impl IndexMarker {
    #[must_use]
    pub const fn named(name: &'static str) -> Self {
        Self {
            name: Some(name),
            unique: false,
            case_insensitive: false,
            partial_filter: None,
        }
    }

    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub const fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    #[must_use]
    pub const fn partial_filter(mut self, filter: &'static str) -> Self {
        self.partial_filter = Some(filter);
        self
    }
}

///
/// FieldIndexModel
/// Class-level index declaration naming an explicit field path.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FieldIndexModel {
    pub name: &'static str,
    pub field: &'static str,
}

impl FieldIndexModel {
    #[must_use]
    pub const fn new(name: &'static str, field: &'static str) -> Self {
        Self { name, field }
    }
}

impl Display for FieldIndexModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.field)
    }
}

///
/// GeoMarker
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct GeoMarker {
    pub name: Option<&'static str>,
}
