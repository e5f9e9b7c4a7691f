//! Top-level facade crate for Supportline.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use supportline_core::*;
}

pub mod gateway {
    pub use supportline_gateway::*;
}
