//! Observability: runtime telemetry (metrics) and sink abstractions.
//!
//! This module does not access storage. Structured logs are emitted with
//! `tracing` at the call sites; counters flow through `MetricsEvent`.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{CollectionCounters, CollectionSummary, EventOps, EventReport, EventState};
pub use sink::{ExecKind, MetricsEvent, MetricsSink, metrics_report, metrics_reset_all};
