//! # hexmap-cache
//!
//! Client-side cache for the hierarchical hex map.
//!
//! ## Role in System
//!
//! - **Single Writer**: owns the normalized tile store; every mutation goes
//!   through the coordinator's methods
//! - **Optimistic**: structural edits hit the store synchronously, then the
//!   remote authority confirms or the edit is rolled back
//! - **Event Source**: publishes exactly one `MapEvent` per successful edit
//!
//! ## Edit Protocol
//!
//! ```text
//! [UI intent] ──→ [MutationCoordinator] ──→ optimistic store patch
//!                        │                        (visible immediately)
//!                        ▼
//!                 [Mutation Gateway]
//!                    │         │
//!                 success    failure
//!                    │         │
//!                    ▼         ▼
//!               finalize    rollback to snapshot
//!               + 1 event   + error, no event
//! ```
//!
//! ## Layers
//!
//! - `domain` - entities, the normalized store and its reducer, errors
//! - `ports` - inbound API trait; outbound gateway/query/time traits
//! - `adapters` - system time source, in-memory gateway authority
//! - `service` - the mutation coordinator and region load paths

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use config::CacheConfig;
pub use domain::*;
pub use ports::*;
pub use service::MapCacheService;
