//! Derives for docrepo entity metadata.
//!
//! `#[derive(Entity)]` emits the static field table, a `Sanitize` impl that
//! trims text fields, and the `Entity` impl naming the key field.
//! `#[derive(Nested)]` does the same for composites stored inside an entity.
//!
//! Generated code refers to `::docrepo`, so these are used through the
//! facade crate.

use proc_macro::TokenStream;

mod entity;
mod field;
mod nested;
mod util;

/// Struct attributes: `database`, `collection`, `audit`, and repeatable
/// `index(name, field)`. Field attributes: `key`, `nested`, `expire`,
/// `geo` / `geo = "Name"`, and repeatable `index` / `index(name, unique,
/// case_insensitive, partial_filter)`.
#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    entity::derive_entity(input.into()).into()
}

#[proc_macro_derive(Nested, attributes(entity))]
pub fn derive_nested(input: TokenStream) -> TokenStream {
    nested::derive_nested(input.into()).into()
}
