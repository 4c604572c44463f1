//! docdex: schema-driven secondary indexes over hash and sorted-set
//! key-value stores.
//!
//! ## Crate layout
//! - `core`: runtime model, index maintenance, relations, listing and the
//!   store port.
//! - `error`: the stable public error taxonomy.
//!
//! The `prelude` module mirrors the surface used by application code.

pub use docdex_core as core;

pub mod error;

pub use error::{Error, ErrorKind, ErrorOrigin};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use docdex_core::{
    config::DocdexConfig,
    db::{Collection, Db, ListOptions, Relation},
    store::{KvStore, MemoryStore},
};

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        Error, ErrorKind,
        core::{
            config::DocdexConfig,
            db::{Collection, Db, ListOptions, Relation},
            defaults::FieldDefaults,
            entity::Entity,
            model::{EntityModel, FieldConfig, IndexDescriptor, Schema},
            store::{Direction, KvStore, MemoryStore},
        },
    };
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Map, Value, json};
}
