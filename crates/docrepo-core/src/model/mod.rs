//! Runtime model definitions.
//!
//! These are the static tables a type declares about itself, either
//! emitted by `#[derive(Entity)]` / `#[derive(Nested)]` or written by hand.
//! The schema resolver reads them; nothing here touches storage.
//!
//! In general:
//! - Model tables define *what is declared*
//! - `schema` defines *what gets provisioned*

pub mod entity;
pub mod field;
pub mod index;
