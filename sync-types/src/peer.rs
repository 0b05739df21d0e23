//! A single peer and its progress counters.

use serde::{Deserialize, Serialize};

use crate::PeerId;

/// One other device participating in sync.
///
/// `has` counts units already exchanged, `wants` the total expected.
/// Every constructor keeps `has <= wants`; `wants == 0` means there is
/// nothing to do with this peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// Stable identifier assigned at discovery.
    pub id: PeerId,
    /// Human-readable label, absent for unknown or renamed devices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Units already synced with this peer.
    pub has: u64,
    /// Units this peer is expected to exchange.
    pub wants: u64,
}

impl Peer {
    /// Create a peer, clamping `has` to `wants`.
    pub fn new(id: impl Into<PeerId>, name: Option<String>, has: u64, wants: u64) -> Self {
        Self {
            id: id.into(),
            name,
            has,
            wants,
        }
        .clamped()
    }

    /// A freshly discovered peer with no known workload yet.
    pub fn discovered(id: impl Into<PeerId>, name: Option<String>) -> Self {
        Self::new(id, name, 0, 0)
    }

    /// Return this peer with `has = min(has, wants)`.
    pub fn clamped(mut self) -> Self {
        self.has = self.has.min(self.wants);
        self
    }

    /// Whether every wanted unit has been received.
    ///
    /// A peer with nothing to do counts as complete.
    pub fn is_complete(&self) -> bool {
        self.has >= self.wants
    }

    /// Units still outstanding.
    pub fn remaining(&self) -> u64 {
        self.wants.saturating_sub(self.has)
    }
}
