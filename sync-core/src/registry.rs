//! Peer registry for peersync.
//!
//! Holds the discovered peers and their last-known counters, keyed by id
//! and iterated in insertion order. Every mutation leaves the registry
//! consistent: counters are normalized and clamped, never rejected.

use std::collections::{btree_map, BTreeMap, HashMap};

use peersync_types::{normalize_counter, AggregateProgress, Peer, PeerId, ProgressUpdate, SyncInput};

use crate::aggregate;

/// Iterator over registry peers in insertion order.
///
/// Finite and cheap to clone; clone it (or call
/// [`PeerRegistry::list_all`] again) to walk the listing twice.
pub type Peers<'a> = btree_map::Values<'a, u64, Peer>;

/// What a mutation did to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// A new peer was added at the end of the order.
    Inserted,
    /// An existing peer's fields were replaced in place.
    Updated,
    /// The input matched what was stored.
    Unchanged,
    /// A peer was deleted.
    Removed,
    /// The input referred to nothing and was dropped.
    Ignored,
}

impl Change {
    /// Whether the observable listing changed.
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Inserted | Self::Updated | Self::Removed)
    }
}

/// Mapping from peer id to peer with stable insertion order.
///
/// Entries live under a monotonically increasing slot number, so the
/// `BTreeMap` yields them in the order they were first inserted. A peer
/// that is removed and later re-inserted gets a fresh slot at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerRegistry {
    /// Peers keyed by insertion slot.
    entries: BTreeMap<u64, Peer>,
    /// Slot of each known peer id.
    slots: HashMap<PeerId, u64>,
    /// Slot handed to the next inserted peer.
    next_slot: u64,
}

impl PeerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a peer or replace the name and counters of an existing one.
    ///
    /// `has` is clamped to `wants` before storing. Replacing keeps the
    /// peer's original position in the listing.
    pub fn upsert(&mut self, peer: Peer) -> Change {
        let peer = peer.clamped();

        let stored = self
            .slots
            .get(&peer.id)
            .and_then(|slot| self.entries.get_mut(slot));
        if let Some(stored) = stored {
            if *stored == peer {
                return Change::Unchanged;
            }
            *stored = peer;
            return Change::Updated;
        }

        let slot = self.next_slot;
        self.next_slot += 1;
        self.slots.insert(peer.id.clone(), slot);
        self.entries.insert(slot, peer);
        Change::Inserted
    }

    /// Delete a peer. Unknown ids are a no-op.
    pub fn remove(&mut self, id: &PeerId) -> Option<Peer> {
        let slot = self.slots.remove(id)?;
        self.entries.remove(&slot)
    }

    /// Look up a peer by id.
    pub fn get(&self, id: &PeerId) -> Option<&Peer> {
        self.slots.get(id).and_then(|slot| self.entries.get(slot))
    }

    /// Whether a peer with this id is known.
    pub fn contains(&self, id: &PeerId) -> bool {
        self.slots.contains_key(id)
    }

    /// All current peers in insertion order.
    pub fn list_all(&self) -> Peers<'_> {
        self.entries.values()
    }

    /// Number of peers currently known.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Whether no peers are known.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Aggregate progress over the current contents.
    pub fn aggregate(&self) -> AggregateProgress {
        aggregate::compute(self.list_all())
    }

    /// Add signed increments to a known peer's counters.
    ///
    /// `wants` is adjusted first, then `has`, then `has` is clamped to the
    /// new `wants`. Both saturate at zero. Unknown ids are ignored.
    pub fn apply_delta(&mut self, id: &PeerId, has: i64, wants: i64) -> Change {
        let Some(current) = self.get(id) else {
            return Change::Ignored;
        };

        let next = Peer::new(
            id.clone(),
            current.name.clone(),
            offset(current.has, has),
            offset(current.wants, wants),
        );
        self.upsert(next)
    }

    /// Apply one discovery or transport input.
    pub fn apply(&mut self, input: SyncInput) -> Change {
        match input {
            SyncInput::PeerAppeared { id, name } => match self.get(&id) {
                Some(existing) => {
                    let peer = Peer::new(id, name, existing.has, existing.wants);
                    self.upsert(peer)
                }
                None => self.upsert(Peer::discovered(id, name)),
            },
            // Immediate removal. A grace period belongs in the source that
            // emits `PeerLost`, not here.
            SyncInput::PeerLost { id } => match self.remove(&id) {
                Some(_) => Change::Removed,
                None => Change::Ignored,
            },
            SyncInput::Progress(ProgressUpdate::Snapshot { id, has, wants }) => {
                let name = self.get(&id).and_then(|peer| peer.name.clone());
                self.upsert(Peer::new(
                    id,
                    name,
                    normalize_counter(has),
                    normalize_counter(wants),
                ))
            }
            SyncInput::Progress(ProgressUpdate::Delta { id, has, wants }) => {
                self.apply_delta(&id, has, wants)
            }
        }
    }
}

/// Shift an unsigned counter by a signed amount, saturating at both ends.
fn offset(value: u64, delta: i64) -> u64 {
    if delta >= 0 {
        value.saturating_add(delta.unsigned_abs())
    } else {
        value.saturating_sub(delta.unsigned_abs())
    }
}
