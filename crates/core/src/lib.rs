//! `tradelink-core`: entity/collection marshaling between untyped JSON and
//! typed domain objects.
//!
//! This crate is **pure data transformation** (no IO, no persistence):
//!
//! - [`Entity`] types are declared with [`entity!`], which records each field's
//!   JSON key and read-only flag in a static table.
//! - [`Collection`] holds entities of one item type, built from JSON arrays.
//! - [`Date`] and [`DateTime`] normalize heterogeneous date input.
//! - [`MetadataRegistry`] caches the exportable field set per entity type.

pub mod collection;
pub mod entity;
pub mod error;
pub mod field;
pub mod registry;
pub mod scalar;

pub use collection::Collection;
pub use entity::Entity;
pub use error::{MarshalError, MarshalResult};
pub use field::{AsText, Field, FieldDef};
pub use registry::MetadataRegistry;
pub use scalar::{Date, DateTime};

pub use serde_json::Value;
