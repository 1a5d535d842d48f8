//! # Hexmap Test Suite
//!
//! Unified test crate for cross-crate flows:
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── flows.rs         # coordinator + bus + in-memory authority
//!     └── bus_contract.rs  # envelope shape seen by subscribers
//! ```
//!
//! Run with `cargo test -p hexmap-tests`.

pub mod integration;

/// Install a compact tracing subscriber for test debugging. Safe to call
/// from every test; only the first call wins.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
