//! Shared fixtures for unit tests.

use crate::{
    config::DocdexConfig,
    defaults::FieldDefaults,
    entity::Entity,
    model::{EntityModel, FieldConfig, Schema},
};
use serde_json::Value;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

///
/// StepDefaults
/// Sequential identifiers (`id-1`, `id-2`, ..) and a clock that advances one
/// millisecond per reading.
///

#[derive(Debug)]
pub(crate) struct StepDefaults {
    next_id: AtomicU64,
    now: AtomicI64,
}

impl StepDefaults {
    pub(crate) const fn starting_at(now: i64) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            now: AtomicI64::new(now),
        }
    }
}

impl FieldDefaults for StepDefaults {
    fn identifier(&self) -> String {
        format!("id-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn timestamp(&self) -> i64 {
        self.now.fetch_add(1, Ordering::SeqCst)
    }
}

pub(crate) fn users_schema() -> Schema {
    Schema::new()
        .field("email", FieldConfig::new().unique())
        .field("role", FieldConfig::new().secondary())
        .field("account", FieldConfig::new().references("accounts"))
        .field("rank", FieldConfig::new().ordered())
}

pub(crate) fn users_model() -> EntityModel {
    EntityModel::from_schema("users", &users_schema(), &DocdexConfig::default())
        .expect("users schema")
}

pub(crate) fn entity(value: Value) -> Entity {
    Entity::try_from(value).expect("entity object")
}
