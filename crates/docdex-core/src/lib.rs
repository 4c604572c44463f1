//! Core runtime for docdex: field paths, key templates, index descriptors,
//! index maintenance, unique enforcement, relations, paginated listing and
//! the store port they drive.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod db;
pub mod defaults;
pub mod entity;
pub mod error;
pub mod model;
pub mod obs;
pub mod path;
pub mod store;
pub mod template;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// CONSTANTS
///

/// Separator placed between key parts (`users:email`, `users:role:admin`).
pub const DEFAULT_KEY_SEPARATOR: &str = ":";

/// Page size used when a listing does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, stores, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        db::{Collection, Db, ListOptions, Relation},
        entity::Entity,
        model::{EntityModel, FieldConfig, IndexDescriptor, Schema},
        path::FieldPath,
        store::Direction,
        template::{KeyExpr, KeyTemplate, TemplateArg},
    };
}
