//! Runtime data model definitions.
//!
//! Types in `model` are built once at setup from declared schemas and read by
//! the index engine, unique enforcement, relations and listing.
//!
//! In general:
//! - `Schema` says *what is declared*
//! - `model` says *what is maintained*

pub mod entity;
pub mod index;
pub mod registry;
pub mod relation;
pub mod schema;


pub use entity::{EntityModel, EntityModelBuilder};
pub use index::{FieldSpec, HashIndex, IndexDescriptor, IndexKind, SortedSetIndex};
pub use registry::IndexRegistry;
pub use relation::{RelationModel, RelationSide};
pub use schema::{FieldConfig, FieldDecl, OrderConfig, Schema};
