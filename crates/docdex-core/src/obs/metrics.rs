use crate::obs::sink::{ExecKind, MetricsEvent};
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::LazyLock};

///
/// EventState
/// Ephemeral, in-memory counters for lifecycle and index operations.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub collections: BTreeMap<String, CollectionCounters>,
    pub since_ms: i64,
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            ops: EventOps::default(),
            collections: BTreeMap::new(),
            since_ms: Utc::now().timestamp_millis(),
        }
    }
}

impl EventState {
    /// Fold one event into the counters.
    pub fn apply(&mut self, event: MetricsEvent<'_>) {
        match event {
            MetricsEvent::ExecStart { kind, collection } => {
                let ops = &mut self.ops;
                let counter = match kind {
                    ExecKind::Insert => &mut ops.insert_calls,
                    ExecKind::Replace => &mut ops.replace_calls,
                    ExecKind::Patch => &mut ops.patch_calls,
                    ExecKind::Delete => &mut ops.delete_calls,
                };
                *counter = counter.saturating_add(1);

                let entry = self.entry(collection);
                entry.write_calls = entry.write_calls.saturating_add(1);
            }

            MetricsEvent::IndexDelta {
                collection,
                inserts,
                removes,
            } => {
                self.ops.index_inserts = self.ops.index_inserts.saturating_add(inserts);
                self.ops.index_removes = self.ops.index_removes.saturating_add(removes);

                let entry = self.entry(collection);
                entry.index_inserts = entry.index_inserts.saturating_add(inserts);
                entry.index_removes = entry.index_removes.saturating_add(removes);
            }

            MetricsEvent::UniqueViolation { collection } => {
                self.ops.unique_violations = self.ops.unique_violations.saturating_add(1);

                let entry = self.entry(collection);
                entry.unique_violations = entry.unique_violations.saturating_add(1);
            }

            MetricsEvent::RelationDelta {
                left,
                right,
                links,
                unlinks,
            } => {
                self.ops.relation_links = self.ops.relation_links.saturating_add(links);
                self.ops.relation_unlinks = self.ops.relation_unlinks.saturating_add(unlinks);

                for collection in [left, right] {
                    let entry = self.entry(collection);
                    entry.relation_links = entry.relation_links.saturating_add(links);
                    entry.relation_unlinks = entry.relation_unlinks.saturating_add(unlinks);
                }
            }

            MetricsEvent::ListPage { collection, rows } => {
                self.ops.list_calls = self.ops.list_calls.saturating_add(1);
                self.ops.rows_listed = self.ops.rows_listed.saturating_add(rows);

                let entry = self.entry(collection);
                entry.list_calls = entry.list_calls.saturating_add(1);
                entry.rows_listed = entry.rows_listed.saturating_add(rows);
            }

            MetricsEvent::DanglingMember { collection } => {
                self.ops.dangling_members = self.ops.dangling_members.saturating_add(1);

                let entry = self.entry(collection);
                entry.dangling_members = entry.dangling_members.saturating_add(1);
            }
        }
    }

    fn entry(&mut self, collection: &str) -> &mut CollectionCounters {
        self.collections.entry(collection.to_string()).or_default()
    }
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Lifecycle entrypoints
    pub insert_calls: u64,
    pub replace_calls: u64,
    pub patch_calls: u64,
    pub delete_calls: u64,

    // Index maintenance
    pub index_inserts: u64,
    pub index_removes: u64,
    pub unique_violations: u64,

    // Relations
    pub relation_links: u64,
    pub relation_unlinks: u64,

    // Listing
    pub list_calls: u64,
    pub rows_listed: u64,
    pub dangling_members: u64,
}

///
/// CollectionCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct CollectionCounters {
    pub write_calls: u64,
    pub index_inserts: u64,
    pub index_removes: u64,
    pub unique_violations: u64,
    pub relation_links: u64,
    pub relation_unlinks: u64,
    pub list_calls: u64,
    pub rows_listed: u64,
    pub dangling_members: u64,
}

static EVENT_STATE: LazyLock<Mutex<EventState>> =
    LazyLock::new(|| Mutex::new(EventState::default()));

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    f(&EVENT_STATE.lock())
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    f(&mut EVENT_STATE.lock())
}

/// Reset all counters.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

///
/// EventReport
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct EventReport {
    /// Ephemeral runtime counters since `since_ms`.
    pub counters: Option<EventState>,
    /// Per-collection counters and averages.
    pub collection_counters: Vec<CollectionSummary>,
}

///
/// CollectionSummary
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct CollectionSummary {
    pub collection: String,
    pub write_calls: u64,
    pub list_calls: u64,
    pub rows_listed: u64,
    pub avg_rows_per_list: f64,
    pub index_inserts: u64,
    pub index_removes: u64,
    pub unique_violations: u64,
    pub dangling_members: u64,
}

/// Build a metrics report from in-memory counters only.
#[must_use]
pub(crate) fn report() -> EventReport {
    let snap = with_state(Clone::clone);
    let collection_counters = summarize(&snap);

    EventReport {
        counters: Some(snap),
        collection_counters,
    }
}

#[allow(clippy::cast_precision_loss)]
fn summarize(state: &EventState) -> Vec<CollectionSummary> {
    let mut summaries: Vec<CollectionSummary> = state
        .collections
        .iter()
        .map(|(collection, c)| CollectionSummary {
            collection: collection.clone(),
            write_calls: c.write_calls,
            list_calls: c.list_calls,
            rows_listed: c.rows_listed,
            avg_rows_per_list: if c.list_calls > 0 {
                c.rows_listed as f64 / c.list_calls as f64
            } else {
                0.0
            },
            index_inserts: c.index_inserts,
            index_removes: c.index_removes,
            unique_violations: c.unique_violations,
            dangling_members: c.dangling_members,
        })
        .collect();

    // busiest collections first
    summaries.sort_by(|a, b| {
        (b.write_calls + b.list_calls)
            .cmp(&(a.write_calls + a.list_calls))
            .then_with(|| a.collection.cmp(&b.collection))
    });

    summaries
}

///
/// TESTS
///
