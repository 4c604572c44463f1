#![allow(dead_code)]

use docdex::prelude::*;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

///
/// Ticking
/// Sequential `t-N` identifiers and a clock that ticks by ten per reading.
///

#[derive(Debug)]
pub struct Ticking {
    next_id: AtomicU64,
    now: AtomicI64,
}

impl Ticking {
    pub const fn at(now: i64) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            now: AtomicI64::new(now),
        }
    }
}

impl FieldDefaults for Ticking {
    fn identifier(&self) -> String {
        format!("t-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn timestamp(&self) -> i64 {
        self.now.fetch_add(10, Ordering::SeqCst)
    }
}

pub fn db() -> Db<MemoryStore> {
    let mut db = Db::new(MemoryStore::new(), DocdexConfig::default())
        .expect("default config")
        .with_defaults(Ticking::at(10_000));

    db.register(
        "users",
        &Schema::new()
            .field("email", FieldConfig::new().unique())
            .field("handle", FieldConfig::new().unique())
            .field("role", FieldConfig::new().secondary())
            .field("org", FieldConfig::new().references("orgs")),
    )
    .expect("users schema");
    db.register("teams", &Schema::new().field("slug", FieldConfig::new().unique()))
        .expect("teams schema");

    db
}

pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("object literal expected, got {other}"),
    }
}

pub fn ids(entities: &[Entity]) -> Vec<String> {
    entities
        .iter()
        .map(|e| e["id"].as_str().expect("string id").to_string())
        .collect()
}
