//! Lightweight in-process metrics (dependency-free).
//!
//! Counters and gauges stored as atomics, rendered by the `/metrics` handler
//! in Prometheus text format.

pub mod metrics;
