use crate::query::{Document, path::set_path};
use serde_json::Value;

///
/// UpdateDocument
///
/// Field assignments for find-and-update. `set` applies on every match;
/// `set_on_insert` applies only when the update creates the document.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateDocument {
    set: Document,
    set_on_insert: Document,
}

impl UpdateDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.insert(field.into(), value.into());
        self
    }

    #[must_use]
    pub fn set_on_insert(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_on_insert.insert(field.into(), value.into());
        self
    }

    #[must_use]
    pub const fn set_fields(&self) -> &Document {
        &self.set
    }

    #[must_use]
    pub const fn set_on_insert_fields(&self) -> &Document {
        &self.set_on_insert
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.set_on_insert.is_empty()
    }

    /// Apply the assignments to `doc`; `inserting` selects whether the
    /// insert-only defaults take part.
    pub fn apply(&self, doc: &mut Document, inserting: bool) {
        if inserting {
            for (field, value) in &self.set_on_insert {
                set_path(doc, field, value.clone());
            }
        }
        for (field, value) in &self.set {
            set_path(doc, field, value.clone());
        }
    }

    #[must_use]
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        if !self.set.is_empty() {
            doc.insert("$set".to_string(), Value::Object(self.set.clone()));
        }
        if !self.set_on_insert.is_empty() {
            doc.insert(
                "$setOnInsert".to_string(),
                Value::Object(self.set_on_insert.clone()),
            );
        }

        doc
    }
}
