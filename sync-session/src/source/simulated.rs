//! Simulated source for demonstrations.
//!
//! Announces a fixed set of peers on the first poll, each with a random
//! workload and head start, then nudges every incomplete peer toward its
//! target on each later poll.

use super::{ProgressSource, SourceError};
use async_trait::async_trait;
use peersync_core::PeerRegistry;
use peersync_types::{PeerId, ProgressUpdate, SyncInput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Largest per-tick increment when none is configured.
pub const DEFAULT_MAX_STEP: u64 = 5;

/// Synthetic peer and progress generator.
#[derive(Debug)]
pub struct SimulatedSource {
    peers: usize,
    max_step: u64,
    rng: StdRng,
    announced: bool,
}

impl SimulatedSource {
    /// Simulate `peers` devices with an entropy-seeded generator.
    pub fn new(peers: usize) -> Self {
        Self::with_rng(peers, StdRng::from_entropy())
    }

    /// Simulate `peers` devices deterministically from `seed`.
    pub fn seeded(peers: usize, seed: u64) -> Self {
        Self::with_rng(peers, StdRng::seed_from_u64(seed))
    }

    fn with_rng(peers: usize, rng: StdRng) -> Self {
        Self {
            peers,
            max_step: DEFAULT_MAX_STEP,
            rng,
            announced: false,
        }
    }

    /// Set the largest increment applied to a peer per tick.
    pub fn with_max_step(mut self, max_step: u64) -> Self {
        self.max_step = max_step;
        self
    }

    /// Id of the `index`-th simulated peer (1-based).
    pub fn peer_id(index: usize) -> PeerId {
        PeerId::new(format!("peer-{index}"))
    }

    fn announce(&mut self) -> Vec<SyncInput> {
        let mut inputs = Vec::with_capacity(self.peers * 2);
        for index in 1..=self.peers {
            let wants: i64 = self.rng.gen_range(1..=100);
            let has: i64 = self.rng.gen_range(0..=wants);
            let id = Self::peer_id(index);

            inputs.push(SyncInput::PeerAppeared {
                id: id.clone(),
                name: Some(format!("Device {index}")),
            });
            inputs.push(SyncInput::Progress(ProgressUpdate::Snapshot { id, has, wants }));
        }
        inputs
    }

    fn advance(&mut self, registry: &PeerRegistry) -> Vec<SyncInput> {
        let mut inputs = Vec::new();
        for peer in registry.list_all().filter(|peer| !peer.is_complete()) {
            let step = self.rng.gen_range(0..=self.max_step).min(peer.remaining());
            if step == 0 {
                continue;
            }
            inputs.push(SyncInput::Progress(ProgressUpdate::Delta {
                id: peer.id.clone(),
                has: i64::try_from(step).unwrap_or(i64::MAX),
                wants: 0,
            }));
        }
        inputs
    }
}

#[async_trait]
impl ProgressSource for SimulatedSource {
    async fn poll(&mut self, registry: &PeerRegistry) -> Result<Vec<SyncInput>, SourceError> {
        if !self.announced {
            self.announced = true;
            return Ok(self.announce());
        }
        Ok(self.advance(registry))
    }
}
