//! Metrics sink boundary.
//!
//! Index, unique, relation and list logic MUST NOT touch obs::metrics
//! directly. All instrumentation flows through MetricsEvent and MetricsSink.

use crate::obs::metrics;

///
/// ExecKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecKind {
    Insert,
    Replace,
    Patch,
    Delete,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MetricsEvent<'a> {
    ExecStart {
        kind: ExecKind,
        collection: &'a str,
    },
    IndexDelta {
        collection: &'a str,
        inserts: u64,
        removes: u64,
    },
    UniqueViolation {
        collection: &'a str,
    },
    RelationDelta {
        left: &'a str,
        right: &'a str,
        links: u64,
        unlinks: u64,
    },
    ListPage {
        collection: &'a str,
        rows: u64,
    },
    DanglingMember {
        collection: &'a str,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent<'_>);
}

/// GlobalMetricsSink
/// Default process-wide sink that writes into global metrics state.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent<'_>) {
        metrics::with_state_mut(|m| m.apply(event));
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent<'_>) {
    GLOBAL_METRICS_SINK.record(event);
}

/// Snapshot the current metrics state.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all metrics state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}
