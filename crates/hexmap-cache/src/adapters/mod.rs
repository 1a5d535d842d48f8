//! Adapters for the outbound ports.
//!
//! - `time` - wall-clock [`crate::ports::TimeSource`]
//! - `memory_gateway` - an in-process authority implementing both the
//!   mutation gateway and the query source, used by integration tests and
//!   demos

pub mod memory_gateway;
pub mod time;

pub use memory_gateway::InMemoryGateway;
pub use time::SystemTimeSource;
