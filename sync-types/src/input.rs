//! Events fed into a session by discovery and transport collaborators.
//!
//! Transports are unreliable, so counters arrive signed and possibly
//! inconsistent. They are normalized when applied, never rejected.

use serde::{Deserialize, Serialize};

use crate::PeerId;

/// One input to the peer registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncInput {
    /// Discovery reported a peer in range.
    PeerAppeared {
        /// The peer's id.
        id: PeerId,
        /// Label advertised by the peer, if any.
        #[serde(default)]
        name: Option<String>,
    },
    /// Discovery reported a peer lost or out of range.
    PeerLost {
        /// The peer's id.
        id: PeerId,
    },
    /// The sync engine reported progress for a peer.
    Progress(ProgressUpdate),
}

impl SyncInput {
    /// The peer this input concerns.
    pub fn peer_id(&self) -> &PeerId {
        match self {
            Self::PeerAppeared { id, .. } | Self::PeerLost { id } => id,
            Self::Progress(update) => update.peer_id(),
        }
    }
}

/// Progress counters for one peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ProgressUpdate {
    /// Absolute counters replacing what is stored.
    Snapshot {
        /// The peer's id.
        id: PeerId,
        /// Units synced so far.
        has: i64,
        /// Units expected in total.
        wants: i64,
    },
    /// Increments added to what is stored.
    Delta {
        /// The peer's id.
        id: PeerId,
        /// Change in units synced.
        has: i64,
        /// Change in units expected.
        wants: i64,
    },
}

impl ProgressUpdate {
    /// The peer this update concerns.
    pub fn peer_id(&self) -> &PeerId {
        match self {
            Self::Snapshot { id, .. } | Self::Delta { id, .. } => id,
        }
    }
}

/// Map a signed transport counter onto the stored unsigned range.
///
/// Negative values become zero.
pub fn normalize_counter(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
