//! Progress sources for peersync.
//!
//! A source is polled once per tick and returns the inputs to apply to
//! the registry before the aggregate is recomputed. This is the seam
//! between the session driver and whatever produces progress:
//! - [`SimulatedSource`] generates demonstration peers and progress
//! - [`ChannelSource`] drains events pushed by a real transport
//! - [`MockSource`] replays scripted batches for tests
//!
//! # Design
//!
//! Sources read the registry but never mutate it. All mutation happens on
//! the session's own timeline, so concurrent transports must go through
//! [`ChannelSource`] rather than touching the registry.

mod channel;
mod mock;
mod simulated;

pub use channel::{channel, ChannelSource, InputSender, DEFAULT_MAX_BATCH};
pub use mock::MockSource;
pub use simulated::{SimulatedSource, DEFAULT_MAX_STEP};

use async_trait::async_trait;
use peersync_core::PeerRegistry;
use peersync_types::SyncInput;
use thiserror::Error;

/// Source errors.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The other end of the source has gone away.
    #[error("source closed")]
    Closed,

    /// The source could not produce input this tick.
    #[error("source failed: {0}")]
    Failed(String),
}

/// Producer of registry inputs, polled once per tick.
///
/// Implementations must return promptly: a poll that waits on the
/// network delays the tick it belongs to.
#[async_trait]
pub trait ProgressSource: Send {
    /// Return the inputs to apply this tick.
    ///
    /// `registry` is the state as of the end of the previous tick.
    async fn poll(&mut self, registry: &PeerRegistry) -> Result<Vec<SyncInput>, SourceError>;
}

#[async_trait]
impl<S: ProgressSource + ?Sized> ProgressSource for Box<S> {
    async fn poll(&mut self, registry: &PeerRegistry) -> Result<Vec<SyncInput>, SourceError> {
        (**self).poll(registry).await
    }
}
