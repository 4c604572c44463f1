//! Module: db::unique
//! Responsibility: reject writes that would give a uniquely indexed value to
//! a second entity.
//! Does not own: index mutations (db::index).
//!
//! The check reads the store and the write happens later in its own batch.
//! Two concurrent writers can both pass the check; the last batch wins the
//! hash entry. Callers needing strict uniqueness must serialize writes.

use crate::{
    db::DbError,
    entity::Entity,
    error::ConflictError,
    model::{EntityModel, HashIndex},
    obs::sink::{self, MetricsEvent},
    store::KvStore,
};
use futures_util::future::try_join_all;

///
/// Probe
/// One resolved unique lookup.
///

struct Probe<'a> {
    index: &'a HashIndex,
    key: String,
    value: String,
}

/// Check every unique index of `model` against the store.
///
/// One `HGET` per unique index whose key and field resolve, all in flight at
/// once. An existing owner that is not `entity` itself is a conflict.
pub async fn enforce_unique<S: KvStore + ?Sized>(
    store: &S,
    model: &EntityModel,
    entity: &Entity,
) -> Result<(), DbError> {
    // Phase 1: resolve
    let probes: Vec<Probe<'_>> = model
        .unique_indexes()
        .filter_map(|index| {
            Some(Probe {
                index,
                key: index.key.resolve(entity)?,
                value: index.field.resolve(entity)?,
            })
        })
        .collect();
    if probes.is_empty() {
        return Ok(());
    }

    // Phase 2: concurrent lookups
    let owners = try_join_all(
        probes
            .iter()
            .map(|probe| store.hget(&probe.key, &probe.value)),
    )
    .await?;

    // Phase 3: report the first conflict in declaration order
    for (probe, owner) in probes.iter().zip(owners) {
        let Some(owner) = owner else {
            continue;
        };
        if probe.index.value.resolve(entity).as_deref() == Some(owner.as_str()) {
            continue;
        }

        let collection = model.collection();
        sink::record(MetricsEvent::UniqueViolation { collection });
        tracing::warn!(
            collection,
            field = %probe.index.field,
            value = %probe.value,
            owner = %owner,
            "unique constraint violated"
        );

        return Err(ConflictError {
            collection: collection.to_string(),
            field: probe.index.field.to_string(),
            value: probe.value.clone(),
            owner,
        }
        .into());
    }

    Ok(())
}

///
/// TESTS
///
