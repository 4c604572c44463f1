//! Module: db::index
//! Responsibility: translate entity snapshots into hash and sorted-set
//! mutations for every descriptor of an entity model.
//! Does not own: uniqueness checks, batch submission, metrics emission.
//! Boundary: lifecycle operations call `index`, `deindex` and `reindex` to
//! extend the one batch each write submits.
//!
//! Every descriptor is resolved before anything is appended, so a failed
//! resolution never leaves a partially extended batch.


use crate::{
    entity::Entity,
    error::InternalError,
    model::{EntityModel, IndexDescriptor, IndexKind},
    store::Batch,
};

///
/// IndexDelta
/// Number of index mutations appended to a batch.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct IndexDelta {
    pub inserts: u64,
    pub removes: u64,
}

impl IndexDelta {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.inserts == 0 && self.removes == 0
    }
}

///
/// Slot
/// Where an index entry lives: hash key + field, or sorted-set key + member.
///

#[derive(Clone, Debug, PartialEq)]
enum Slot {
    Hash { key: String, field: String },
    SortedSet { key: String, member: String },
}

///
/// IndexEntry
/// One fully resolved index entry.
///

#[derive(Clone, Debug, PartialEq)]
enum IndexEntry {
    Hash {
        key: String,
        field: String,
        value: String,
    },
    SortedSet {
        key: String,
        member: String,
        score: f64,
    },
}

impl IndexEntry {
    /// Resolve the entry `descriptor` defines for `entity`.
    ///
    /// `Ok(None)` when a defining coordinate is absent; the descriptor is
    /// skipped for this entity.
    fn resolve(
        descriptor: &IndexDescriptor,
        entity: &Entity,
    ) -> Result<Option<Self>, InternalError> {
        match &descriptor.kind {
            IndexKind::Hash(index) => {
                let (Some(key), Some(field), Some(value)) = (
                    index.key.resolve(entity),
                    index.field.resolve(entity),
                    index.value.resolve(entity),
                ) else {
                    return Ok(None);
                };

                Ok(Some(Self::Hash { key, field, value }))
            }
            IndexKind::SortedSet(index) => {
                let (Some(key), Some(member)) =
                    (index.key.resolve(entity), index.member.resolve(entity))
                else {
                    return Ok(None);
                };
                let Some(score) = entity.score(&index.score)? else {
                    return Ok(None);
                };

                Ok(Some(Self::SortedSet { key, member, score }))
            }
        }
    }

    fn slot(&self) -> Slot {
        match self {
            Self::Hash { key, field, .. } => Slot::Hash {
                key: key.clone(),
                field: field.clone(),
            },
            Self::SortedSet { key, member, .. } => Slot::SortedSet {
                key: key.clone(),
                member: member.clone(),
            },
        }
    }

    fn add_to(self, batch: &mut Batch) {
        match self {
            Self::Hash { key, field, value } => batch.hset(key, field, value),
            Self::SortedSet { key, member, score } => batch.zadd(key, score, member),
        }
    }

    fn remove_from(self, batch: &mut Batch) {
        match self {
            Self::Hash { key, field, .. } => batch.hdel(key, field),
            Self::SortedSet { key, member, .. } => batch.zrem(key, member),
        }
    }
}

/// Append the addition of every index entry of `data`.
pub fn index(
    batch: &mut Batch,
    model: &EntityModel,
    data: &Entity,
) -> Result<IndexDelta, InternalError> {
    let entries = resolve_all(model, data)?;
    let mut delta = IndexDelta::default();

    for entry in entries.into_iter().flatten() {
        entry.add_to(batch);
        delta.inserts += 1;
    }

    Ok(delta)
}

/// Append the removal of every index entry of `data`.
pub fn deindex(
    batch: &mut Batch,
    model: &EntityModel,
    data: &Entity,
) -> Result<IndexDelta, InternalError> {
    let entries = resolve_all(model, data)?;
    let mut delta = IndexDelta::default();

    for entry in entries.into_iter().flatten() {
        entry.remove_from(batch);
        delta.removes += 1;
    }

    Ok(delta)
}

/// Append the minimal mutations that move the index entries of `orig` to
/// those of `data`.
///
/// Unchanged entries produce nothing. An entry whose slot is unchanged is
/// overwritten by the addition alone; a moved entry is removed from its old
/// slot and added at the new one. Removals precede additions in the batch.
pub fn reindex(
    batch: &mut Batch,
    model: &EntityModel,
    data: &Entity,
    orig: &Entity,
) -> Result<IndexDelta, InternalError> {
    let (new_id, old_id) = (model.id_of(data), model.id_of(orig));
    if new_id != old_id {
        return Err(InternalError::index_invariant(format!(
            "reindex of '{}' across identifiers: {old_id:?} -> {new_id:?}",
            model.collection()
        )));
    }

    // Phase 1: resolve both sides for every descriptor
    let next = resolve_all(model, data)?;
    let prev: Vec<Option<IndexEntry>> = model
        .indexes()
        .iter()
        .map(|descriptor| {
            // an unresolvable score was never indexed
            IndexEntry::resolve(descriptor, orig).ok().flatten()
        })
        .collect();

    // Phase 2: diff
    let mut removes = Vec::new();
    let mut adds = Vec::new();
    for (old, new) in prev.into_iter().zip(next) {
        match (old, new) {
            (None, None) => {}
            (Some(old), None) => removes.push(old),
            (None, Some(new)) => adds.push(new),
            (Some(old), Some(new)) => {
                if old == new {
                    continue;
                }
                if old.slot() != new.slot() {
                    removes.push(old);
                }
                adds.push(new);
            }
        }
    }

    // Phase 3: append
    let delta = IndexDelta {
        inserts: adds.len() as u64,
        removes: removes.len() as u64,
    };
    for entry in removes {
        entry.remove_from(batch);
    }
    for entry in adds {
        entry.add_to(batch);
    }

    Ok(delta)
}

fn resolve_all(
    model: &EntityModel,
    entity: &Entity,
) -> Result<Vec<Option<IndexEntry>>, InternalError> {
    model
        .indexes()
        .iter()
        .map(|descriptor| IndexEntry::resolve(descriptor, entity))
        .collect()
}
