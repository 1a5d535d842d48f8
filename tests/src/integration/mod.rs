//! Cross-crate integration tests.

pub mod bus_contract;
pub mod flows;
