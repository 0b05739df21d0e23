//! # sync-session
//!
//! Sync session driver for peersync.
//!
//! This is the crate applications use to track peer sync progress.
//!
//! ## Features
//!
//! - **Explicit Session Object**: `start`/`stop` driven by whatever layer owns activation
//! - **Discovery Window**: searching → peers found / idle, cancelled cleanly on teardown
//! - **Pluggable Sources**: simulated, transport-fed channel, scripted mock
//! - **Non-blocking Subscriptions**: latest-value delivery that never stalls the tick loop
//! - **Pure Core**: registry, aggregation and lifecycle logic come from sync-core
//!
//! ## Example
//!
//! ```ignore
//! use peersync_session::{SessionConfig, SimulatedSource, SyncSession};
//!
//! let mut session = SyncSession::new(SessionConfig::default(), SimulatedSource::new(15))?;
//! let _subscription = session.subscribe(|snapshot| {
//!     println!("{} {}", snapshot.state, snapshot.progress);
//! });
//!
//! session.start().await;
//! // ... screen loses focus
//! session.stop().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod session;
pub mod source;

pub use session::{SessionConfig, SessionError, Subscription, SyncSession, DEFAULT_TICK_INTERVAL};
pub use source::{
    channel, ChannelSource, InputSender, MockSource, ProgressSource, SimulatedSource, SourceError,
};
