//! Transport-fed source.
//!
//! Transports run on their own tasks and push [`SyncInput`]s through an
//! [`InputSender`]. The paired [`ChannelSource`] is the single consumer:
//! each tick drains what is queued, so every event reaches the registry
//! on the session's timeline, in arrival order.

use super::{ProgressSource, SourceError};
use async_trait::async_trait;
use peersync_core::PeerRegistry;
use peersync_types::{PeerId, ProgressUpdate, SyncInput};
use tokio::sync::mpsc::{self, error::TryRecvError};

/// Most inputs applied in a single tick; the rest wait for the next one.
pub const DEFAULT_MAX_BATCH: usize = 1024;

/// Create a connected sender/source pair.
pub fn channel() -> (InputSender, ChannelSource) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        InputSender { tx },
        ChannelSource {
            rx,
            max_batch: DEFAULT_MAX_BATCH,
            closed: false,
        },
    )
}

/// Cloneable handle transports use to feed a session.
#[derive(Debug, Clone)]
pub struct InputSender {
    tx: mpsc::UnboundedSender<SyncInput>,
}

impl InputSender {
    /// Queue one input for the next tick.
    ///
    /// Fails only once the session's source has been dropped.
    pub fn send(&self, input: SyncInput) -> Result<(), SourceError> {
        self.tx.send(input).map_err(|_| SourceError::Closed)
    }

    /// Report a peer in range.
    pub fn peer_appeared(
        &self,
        id: impl Into<PeerId>,
        name: Option<String>,
    ) -> Result<(), SourceError> {
        self.send(SyncInput::PeerAppeared {
            id: id.into(),
            name,
        })
    }

    /// Report a peer lost.
    pub fn peer_lost(&self, id: impl Into<PeerId>) -> Result<(), SourceError> {
        self.send(SyncInput::PeerLost { id: id.into() })
    }

    /// Report absolute counters for a peer.
    pub fn progress(&self, id: impl Into<PeerId>, has: i64, wants: i64) -> Result<(), SourceError> {
        self.send(SyncInput::Progress(ProgressUpdate::Snapshot {
            id: id.into(),
            has,
            wants,
        }))
    }

    /// Report counter increments for a peer.
    pub fn progress_delta(
        &self,
        id: impl Into<PeerId>,
        has: i64,
        wants: i64,
    ) -> Result<(), SourceError> {
        self.send(SyncInput::Progress(ProgressUpdate::Delta {
            id: id.into(),
            has,
            wants,
        }))
    }

    /// Whether the receiving source is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Single-consumer end of a transport channel.
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::UnboundedReceiver<SyncInput>,
    max_batch: usize,
    closed: bool,
}

impl ChannelSource {
    /// Cap how many inputs one tick applies (minimum 1).
    pub fn with_max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch.max(1);
        self
    }

    /// Whether every sender has been dropped and the queue is drained.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl ProgressSource for ChannelSource {
    async fn poll(&mut self, _registry: &PeerRegistry) -> Result<Vec<SyncInput>, SourceError> {
        let mut batch = Vec::new();
        while batch.len() < self.max_batch {
            match self.rx.try_recv() {
                Ok(input) => batch.push(input),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.closed {
                        tracing::debug!("all input senders dropped");
                        self.closed = true;
                    }
                    break;
                }
            }
        }
        Ok(batch)
    }
}
