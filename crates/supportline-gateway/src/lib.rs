//! Supportline gateway library entry.
//!
//! This crate wires the transport, auth seam, message store, and realtime
//! chat core into a cohesive gateway stack. It is intended to be consumed by
//! the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod auth;
pub mod config;
pub mod obs;
pub mod ops;
pub mod realtime;
pub mod router;
pub mod store;
pub mod transport;
