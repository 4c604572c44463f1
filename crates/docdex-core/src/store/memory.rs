use crate::store::{Batch, Direction, KvStore, Mutation, StoreError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::{
    cmp::Ordering,
    collections::{BTreeMap, btree_map::Entry},
};

///
/// MemoryValue
///

#[derive(Clone, Debug, PartialEq)]
pub enum MemoryValue {
    Hash(BTreeMap<String, String>),
    SortedSet(BTreeMap<String, f64>),
}

impl MemoryValue {
    fn is_empty(&self) -> bool {
        match self {
            Self::Hash(fields) => fields.is_empty(),
            Self::SortedSet(members) => members.is_empty(),
        }
    }
}

///
/// MemoryStore
///
/// In-process `KvStore` with Redis hash and sorted-set semantics. Every
/// command runs under one lock; `exec` applies a batch to a copy of the
/// keyspace and swaps it in only when every mutation succeeded.
///

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    keys: BTreeMap<String, MemoryValue>,
    calls: BTreeMap<&'static str, u64>,
    fail_next_exec: Option<StoreError>,
}

impl MemoryState {
    fn count(&mut self, command: &'static str) {
        let calls = self.calls.entry(command).or_default();
        *calls = calls.saturating_add(1);
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `exec` fail with `err` without applying anything.
    pub fn fail_next_exec(&self, err: StoreError) {
        self.state.lock().fail_next_exec = Some(err);
    }

    /// Number of times `command` (upper case, e.g. `"HMGET"`) was issued.
    #[must_use]
    pub fn calls(&self, command: &str) -> u64 {
        self.state.lock().calls.get(command).copied().unwrap_or(0)
    }

    /// Copy of the whole keyspace.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, MemoryValue> {
        self.state.lock().keys.clone()
    }

    /// Fields of the hash at `key`; empty when absent or of another type.
    #[must_use]
    pub fn hash(&self, key: &str) -> BTreeMap<String, String> {
        match self.state.lock().keys.get(key) {
            Some(MemoryValue::Hash(fields)) => fields.clone(),
            _ => BTreeMap::new(),
        }
    }

    /// Members of the sorted set at `key` in ascending rank order.
    #[must_use]
    pub fn sorted_set(&self, key: &str) -> Vec<(String, f64)> {
        match self.state.lock().keys.get(key) {
            Some(MemoryValue::SortedSet(members)) => ranked(members)
                .into_iter()
                .map(|(member, score)| (member.clone(), score))
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        state.count("HSET");
        hash_mut(&mut state.keys, key)?.insert(field.to_string(), value.to_string());

        Ok(())
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        let mut state = self.state.lock();
        state.count("HGET");

        Ok(hash_ref(&state.keys, key)?.and_then(|fields| fields.get(field).cloned()))
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        let mut state = self.state.lock();
        state.count("HDEL");

        hdel(&mut state.keys, key, field)
    }

    async fn hmget(
        &self,
        key: &str,
        fields: &[String],
    ) -> Result<Vec<Option<String>>, StoreError> {
        let mut state = self.state.lock();
        state.count("HMGET");

        let hash = hash_ref(&state.keys, key)?;
        Ok(fields
            .iter()
            .map(|field| hash.and_then(|values| values.get(field).cloned()))
            .collect())
    }

    async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        state.count("ZADD");

        zadd(&mut state.keys, key, score, member)
    }

    async fn zrem(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let mut state = self.state.lock();
        state.count("ZREM");

        zrem(&mut state.keys, key, member)
    }

    async fn zrange(
        &self,
        key: &str,
        start: i64,
        stop: i64,
        direction: Direction,
    ) -> Result<Vec<String>, StoreError> {
        let mut state = self.state.lock();
        state.count(match direction {
            Direction::Asc => "ZRANGE",
            Direction::Desc => "ZREVRANGE",
        });

        let Some(members) = zset_ref(&state.keys, key)? else {
            return Ok(Vec::new());
        };

        let mut ordered = ranked(members);
        if direction == Direction::Desc {
            ordered.reverse();
        }

        let Some((from, to)) = clamp_range(start, stop, ordered.len()) else {
            return Ok(Vec::new());
        };

        Ok(ordered[from..=to]
            .iter()
            .map(|(member, _)| (*member).clone())
            .collect())
    }

    async fn exec(&self, batch: Batch) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        state.count("EXEC");

        if let Some(err) = state.fail_next_exec.take() {
            return Err(err);
        }

        let mut keys = state.keys.clone();
        for mutation in batch {
            match mutation {
                Mutation::HSet { key, field, value } => {
                    hash_mut(&mut keys, &key)?.insert(field, value);
                }
                Mutation::HDel { key, field } => {
                    hdel(&mut keys, &key, &field)?;
                }
                Mutation::ZAdd { key, score, member } => zadd(&mut keys, &key, score, &member)?,
                Mutation::ZRem { key, member } => {
                    zrem(&mut keys, &key, &member)?;
                }
            }
        }
        state.keys = keys;

        Ok(())
    }
}

fn wrong_type(key: &str) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
    }
}

fn hash_ref<'a>(
    keys: &'a BTreeMap<String, MemoryValue>,
    key: &str,
) -> Result<Option<&'a BTreeMap<String, String>>, StoreError> {
    match keys.get(key) {
        None => Ok(None),
        Some(MemoryValue::Hash(fields)) => Ok(Some(fields)),
        Some(MemoryValue::SortedSet(_)) => Err(wrong_type(key)),
    }
}

fn zset_ref<'a>(
    keys: &'a BTreeMap<String, MemoryValue>,
    key: &str,
) -> Result<Option<&'a BTreeMap<String, f64>>, StoreError> {
    match keys.get(key) {
        None => Ok(None),
        Some(MemoryValue::SortedSet(members)) => Ok(Some(members)),
        Some(MemoryValue::Hash(_)) => Err(wrong_type(key)),
    }
}

fn hash_mut<'a>(
    keys: &'a mut BTreeMap<String, MemoryValue>,
    key: &str,
) -> Result<&'a mut BTreeMap<String, String>, StoreError> {
    match keys
        .entry(key.to_string())
        .or_insert_with(|| MemoryValue::Hash(BTreeMap::new()))
    {
        MemoryValue::Hash(fields) => Ok(fields),
        MemoryValue::SortedSet(_) => Err(wrong_type(key)),
    }
}

fn hdel(
    keys: &mut BTreeMap<String, MemoryValue>,
    key: &str,
    field: &str,
) -> Result<bool, StoreError> {
    let Entry::Occupied(mut entry) = keys.entry(key.to_string()) else {
        return Ok(false);
    };
    let MemoryValue::Hash(fields) = entry.get_mut() else {
        return Err(wrong_type(key));
    };

    let existed = fields.remove(field).is_some();
    if entry.get().is_empty() {
        entry.remove();
    }

    Ok(existed)
}

fn zadd(
    keys: &mut BTreeMap<String, MemoryValue>,
    key: &str,
    score: f64,
    member: &str,
) -> Result<(), StoreError> {
    if !score.is_finite() {
        return Err(StoreError::Backend(format!(
            "value is not a valid float: {score}"
        )));
    }

    match keys
        .entry(key.to_string())
        .or_insert_with(|| MemoryValue::SortedSet(BTreeMap::new()))
    {
        MemoryValue::SortedSet(members) => {
            members.insert(member.to_string(), score);
            Ok(())
        }
        MemoryValue::Hash(_) => Err(wrong_type(key)),
    }
}

fn zrem(
    keys: &mut BTreeMap<String, MemoryValue>,
    key: &str,
    member: &str,
) -> Result<bool, StoreError> {
    let Entry::Occupied(mut entry) = keys.entry(key.to_string()) else {
        return Ok(false);
    };
    let MemoryValue::SortedSet(members) = entry.get_mut() else {
        return Err(wrong_type(key));
    };

    let existed = members.remove(member).is_some();
    if entry.get().is_empty() {
        entry.remove();
    }

    Ok(existed)
}

// Ascending by score, ties broken by member.
fn ranked(members: &BTreeMap<String, f64>) -> Vec<(&String, f64)> {
    let mut ordered: Vec<_> = members.iter().map(|(m, s)| (m, *s)).collect();
    ordered.sort_by(|(a_member, a), (b_member, b)| {
        a.partial_cmp(b)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a_member.cmp(b_member))
    });

    ordered
}

// Redis inclusive range normalization; `None` when the range is empty.
fn clamp_range(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    let len = i64::try_from(len).ok()?;
    let start = if start < 0 { (start + len).max(0) } else { start };
    let stop = if stop < 0 { stop + len } else { stop.min(len - 1) };

    if len == 0 || start > stop || start >= len {
        return None;
    }

    Some((usize::try_from(start).ok()?, usize::try_from(stop).ok()?))
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    #[test]
    fn clamp_range_follows_redis() {
        assert_eq!(clamp_range(0, -1, 3), Some((0, 2)));
        assert_eq!(clamp_range(0, 9, 3), Some((0, 2)));
        assert_eq!(clamp_range(-2, -1, 3), Some((1, 2)));
        assert_eq!(clamp_range(-9, 0, 3), Some((0, 0)));
        assert_eq!(clamp_range(3, 5, 3), None);
        assert_eq!(clamp_range(2, 1, 3), None);
        assert_eq!(clamp_range(0, -1, 0), None);
    }

    #[tokio::test]
    async fn sorted_sets_rank_by_score_then_member() {
        let store = MemoryStore::new();
        store.zadd("z", 2.0, "b").await.unwrap();
        store.zadd("z", 1.0, "c").await.unwrap();
        store.zadd("z", 2.0, "a").await.unwrap();

        let asc = store.zrange("z", 0, -1, Direction::Asc).await.unwrap();
        assert_eq!(asc, ["c", "a", "b"]);

        let desc = store.zrange("z", 0, 1, Direction::Desc).await.unwrap();
        assert_eq!(desc, ["b", "a"]);

        // upsert moves the member
        store.zadd("z", 0.5, "b").await.unwrap();
        let asc = store.zrange("z", 0, -1, Direction::Asc).await.unwrap();
        assert_eq!(asc, ["b", "c", "a"]);
    }

    #[tokio::test]
    async fn empty_collections_disappear() {
        let store = MemoryStore::new();
        store.hset("h", "f", "v").await.unwrap();
        store.zadd("z", 1.0, "m").await.unwrap();

        assert!(store.hdel("h", "f").await.unwrap());
        assert!(store.zrem("z", "m").await.unwrap());
        assert!(!store.zrem("z", "m").await.unwrap());
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn wrong_type_is_reported() {
        let store = MemoryStore::new();
        store.hset("k", "f", "v").await.unwrap();

        let err = store.zadd("k", 1.0, "m").await.unwrap_err();
        assert_eq!(err, StoreError::WrongType { key: "k".into() });
        assert!(store.zrange("k", 0, -1, Direction::Asc).await.is_err());
    }

    #[tokio::test]
    async fn hmget_preserves_request_order() {
        let store = MemoryStore::new();
        store.hset("h", "a", "1").await.unwrap();
        store.hset("h", "c", "3").await.unwrap();

        let fields = ["c".to_string(), "b".to_string(), "a".to_string()];
        let values = store.hmget("h", &fields).await.unwrap();

        assert_eq!(values, [Some("3".to_string()), None, Some("1".to_string())]);
        assert_eq!(store.calls("HMGET"), 1);
    }

    #[test]
    fn failed_exec_applies_nothing() {
        let store = MemoryStore::new();
        block_on(store.hset("users", "u1", "{}")).unwrap();
        let before = store.snapshot();

        // second mutation hits a hash with ZADD
        let mut batch = Batch::new();
        batch.hset("users", "u2", "{}");
        batch.zadd("users", 1.0, "u2");

        assert!(block_on(store.exec(batch.clone())).is_err());
        assert_eq!(store.snapshot(), before);

        store.fail_next_exec(StoreError::Unavailable("down".into()));
        let mut batch = Batch::new();
        batch.hset("users", "u3", "{}");
        let err = block_on(store.exec(batch.clone())).unwrap_err();

        assert_eq!(err, StoreError::Unavailable("down".into()));
        assert_eq!(store.snapshot(), before);

        // injection is one-shot
        block_on(store.exec(batch)).unwrap();
        assert_eq!(store.hash("users").len(), 2);
    }
}
