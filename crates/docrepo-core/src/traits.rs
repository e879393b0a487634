pub use crate::sanitize::Sanitize;
pub use serde::{Serialize, de::DeserializeOwned};

use crate::model::{entity::EntityModel, field::ShapeModel};
use std::fmt::Display;

///
/// Shape
/// A type with a static field table, either an entity or a nested composite.
///

pub trait Shape {
    const SHAPE: &'static ShapeModel;
}

///
/// Entity
/// A record stored as one document in one collection.
///

pub trait Entity:
    Shape + Sanitize + Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
    type Key: Serialize + Display + Clone + Send + Sync;

    const MODEL: &'static EntityModel;

    fn key(&self) -> Self::Key;

    /// Human-readable label used in audit operation names.
    fn describe(&self) -> String {
        format!("{} with Id: {}", Self::MODEL.type_name, self.key())
    }
}
