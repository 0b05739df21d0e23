//! Progress aggregation for peersync.
//!
//! Reduces a set of peers to one completion percentage by summing
//! counters across peers and dividing once:
//!
//! ```text
//! percentage = floor(100 * Σhas / Σwants)      (0 when Σwants == 0)
//! ```
//!
//! This weights each peer by its volume. A peer wanting 990 units moves
//! the aggregate far more than one wanting 10, which an average of
//! per-peer percentages would not capture.

use peersync_types::{AggregateProgress, Peer};

/// Aggregate progress over any collection of peers.
///
/// Pure and cheap; safe to call on every tick. An empty input yields
/// [`AggregateProgress::EMPTY`].
pub fn compute<'a, I>(peers: I) -> AggregateProgress
where
    I: IntoIterator<Item = &'a Peer>,
{
    let mut peer_count = 0usize;
    let mut total_has = 0u128;
    let mut total_wants = 0u128;

    for peer in peers {
        peer_count += 1;
        // Re-clamp so a hand-built peer cannot push the sum past 100%.
        total_has += u128::from(peer.has.min(peer.wants));
        total_wants += u128::from(peer.wants);
    }

    if peer_count == 0 {
        return AggregateProgress::EMPTY;
    }

    AggregateProgress {
        percentage: ratio(total_has, total_wants),
        peer_count,
    }
}

/// Completion percentage of a single `has`/`wants` pair.
///
/// Same floor rule as [`compute`], for per-peer progress bars.
pub fn percentage(has: u64, wants: u64) -> u8 {
    ratio(u128::from(has), u128::from(wants))
}

fn ratio(has: u128, wants: u128) -> u8 {
    if wants == 0 {
        return 0;
    }
    // min(100) keeps the cast lossless.
    (has.saturating_mul(100) / wants).min(100) as u8
}
