//! Compute overall progress from a file of peer records.

use anyhow::{Context, Result};
use peersync_core::{percentage, PeerRegistry};
use peersync_types::{PeerId, ProgressUpdate, SyncInput};
use serde::Deserialize;
use std::path::Path;

/// One entry of the peer file.
///
/// Counters are signed to accept raw transport dumps.
#[derive(Debug, Deserialize)]
struct PeerRecord {
    id: PeerId,
    #[serde(default)]
    name: Option<String>,
    has: i64,
    wants: i64,
}

/// Run the aggregate command.
pub fn run(path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let registry = load(&content).with_context(|| format!("Invalid peer file {}", path.display()))?;
    print!("{}", report(&registry));
    Ok(())
}

/// Build a registry from a JSON array of peer records.
///
/// Later records with the same id replace earlier ones.
fn load(content: &str) -> Result<PeerRegistry> {
    let records: Vec<PeerRecord> = serde_json::from_str(content)?;
    let mut registry = PeerRegistry::new();
    for record in records {
        registry.apply(SyncInput::PeerAppeared {
            id: record.id.clone(),
            name: record.name,
        });
        registry.apply(SyncInput::Progress(ProgressUpdate::Snapshot {
            id: record.id,
            has: record.has,
            wants: record.wants,
        }));
    }
    Ok(registry)
}

fn report(registry: &PeerRegistry) -> String {
    let mut out = format!("Overall: {}\n", registry.aggregate());
    for peer in registry.list_all() {
        let label = peer.name.as_deref().unwrap_or(peer.id.as_str());
        out.push_str(&format!(
            "  {:<20} {:>3}% ({}/{})\n",
            label,
            percentage(peer.has, peer.wants),
            peer.has,
            peer.wants
        ));
    }
    out
}
