//! # sync-core
//!
//! Pure logic for peersync (no I/O, instant tests).
//!
//! This crate implements the peer registry, the progress aggregator and
//! the discovery lifecycle state machine without timers, threads or
//! channels.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! The timers and the tick loop live in `sync-session`, which interprets
//! the actions produced by the lifecycle state machine.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregate;
pub mod discovery;
pub mod registry;

pub use aggregate::{compute, percentage};
pub use discovery::{DiscoveryLifecycle, LifecycleAction, LifecycleEvent, DEFAULT_DISCOVERY_WINDOW};
pub use registry::{Change, PeerRegistry, Peers};
