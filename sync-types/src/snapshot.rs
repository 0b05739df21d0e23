//! Values produced for the presentation layer.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Peer;

/// Overall sync completion across all known peers.
///
/// Derived from the registry on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct AggregateProgress {
    /// Completion in `[0, 100]`, floored.
    pub percentage: u8,
    /// Number of peers that went into the computation.
    pub peer_count: usize,
}

impl AggregateProgress {
    /// Aggregate of an empty registry.
    pub const EMPTY: Self = Self {
        percentage: 0,
        peer_count: 0,
    };

    /// True once there is at least one peer and everything is synced.
    pub fn is_complete(&self) -> bool {
        self.peer_count > 0 && self.percentage == 100
    }
}

impl fmt::Display for AggregateProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}% ({} peers)", self.percentage, self.peer_count)
    }
}

/// Discovery lifecycle of the active sync session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryState {
    /// Waiting out the discovery window. Peers are not presented yet.
    #[default]
    Searching,
    /// The window elapsed with at least one peer known.
    PeersFound,
    /// The window elapsed with no peers known.
    Idle,
}

impl DiscoveryState {
    /// Whether presentation may show the peer listing.
    pub fn presents_peers(&self) -> bool {
        !matches!(self, Self::Searching)
    }
}

impl fmt::Display for DiscoveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Searching => "searching",
            Self::PeersFound => "peers_found",
            Self::Idle => "idle",
        };
        f.write_str(label)
    }
}

/// Read-only view of a session at one instant.
///
/// `progress.peer_count` always reflects the registry, while `peers` is
/// left empty during [`DiscoveryState::Searching`] so presentation keeps
/// showing the searching indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SyncSnapshot {
    /// Ticks completed when this snapshot was taken (0 before the first).
    pub tick: u64,
    /// Current discovery lifecycle state.
    pub state: DiscoveryState,
    /// Current aggregate progress.
    pub progress: AggregateProgress,
    /// Peers in stable insertion order.
    pub peers: Vec<Peer>,
}
