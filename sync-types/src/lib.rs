//! # sync-types
//!
//! Plain data types shared by every peersync crate.
//!
//! This crate provides the values that flow between layers:
//! - [`PeerId`], [`Peer`] - A discovered device and its progress counters
//! - [`AggregateProgress`], [`DiscoveryState`] - The two outputs presentation renders
//! - [`SyncSnapshot`] - Everything presentation needs for one frame
//! - [`SyncInput`], [`ProgressUpdate`] - Events fed in by discovery and transport

#![warn(missing_docs)]
#![warn(clippy::all)]

mod ids;
mod input;
mod peer;
mod snapshot;

pub use ids::PeerId;
pub use input::{normalize_counter, ProgressUpdate, SyncInput};
pub use peer::Peer;
pub use snapshot::{AggregateProgress, DiscoveryState, SyncSnapshot};
