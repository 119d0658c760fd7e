//! Observability module
//!
//! Hub metrics are emitted through the `metrics` facade. Without an installed
//! recorder every call is a no-op, so library code can record unconditionally.

pub mod metrics_recorder;

pub use metrics_recorder::describe_metrics;
